//! # Integration Module
//!
//! Everything the host application touches: the collaborator traits, their
//! default implementations, and [`NetworkedEntity`], which ties one entity's
//! role, engine and collaborators together.
//!
//! ## Per-tick flow
//!
//! ```text
//! InputSampler ─▶ NetworkedEntity ─▶ Transport
//!                      │   ▲
//!      Kinematics ◀────┘   └──── on_command_received / on_snapshot_received
//!                      │
//!                      ▼
//!                  PoseSink
//! ```

mod entity;
mod input;
mod kinematics;
mod traits;

pub use entity::NetworkedEntity;
pub use input::{round_to_largest, AxisMapping, RawAxes, ScriptedSampler, DEFAULT_LOOK_SENSITIVITY};
pub use kinematics::WalkerKinematics;
pub use traits::{IdleSampler, InputSampler, Kinematics, NullSink, PoseSink, RecordingSink};
