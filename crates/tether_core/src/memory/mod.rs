//! # Memory Management
//!
//! Fixed-capacity buffers for per-entity synchronization state.
//!
//! ## Design Philosophy
//!
//! Every buffer is allocated once, when its entity is created. During play:
//! - No growth past the configured capacity
//! - Overflow is a policy decision made by the caller (reject or evict)
//! - Worst-case memory and replay cost are known up front

mod bounded;

pub use bounded::BoundedQueue;
