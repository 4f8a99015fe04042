//! # Tether Core
//!
//! Value types shared by every peer taking part in movement synchronization:
//! - `Position`, `Orientation` and `Pose`, copied across the transport boundary
//! - `BoundedQueue`, the fixed-capacity FIFO behind every input and result buffer
//!
//! ## Architecture Rules
//!
//! 1. **Values, not references** - poses are `Copy` and never shared between peers
//! 2. **Bounded memory** - every buffer is sized once, at entity creation
//! 3. **Pure math** - nothing here reads a clock or a device
//!
//! ## Example
//!
//! ```rust
//! use tether_core::{Orientation, Pose, Position};
//!
//! let start = Pose::new(Position::new(0.0, 0.0, 0.0), Orientation::IDENTITY);
//! let end = Pose::new(Position::new(2.0, 0.0, 0.0), Orientation::IDENTITY);
//! let mid = start.interpolate(end, 0.5);
//! assert!((mid.position.x - 1.0).abs() < 1e-6);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;
pub mod pose;

pub use memory::BoundedQueue;
pub use pose::{Orientation, Pose, Position};
