//! # Tether Net - Server-Authoritative Movement
//!
//! Hides network latency for the controlling client while every peer converges
//! on the authority's simulation.
//!
//! ## Architecture
//!
//! Each simulated entity runs one of four roles, fixed for its lifetime:
//!
//! | owner | authority | role              | per tick                          | on snapshot   |
//! |-------|-----------|-------------------|-----------------------------------|---------------|
//! | yes   | yes       | Host              | simulate own input, emit on change | -             |
//! | yes   | no        | Predicting client | predict, buffer, send command      | reconcile     |
//! | no    | yes       | Remote simulator  | consume one queued input, emit     | -             |
//! | no    | no        | Observer          | play back buffered snapshots       | buffer        |
//!
//! ```text
//! OWNER                          AUTHORITY                       OBSERVER
//!   | sample -> predict             |                               |
//!   |--- command (reliable) ------->| queue -> simulate             |
//!   |                               |   dirty? -> snapshot          |
//!   |<-- snapshot (unreliable) -----|--- snapshot (unreliable) ---->|
//!   | rewind -> replay newer inputs |                 buffer -> interpolate
//! ```
//!
//! Movement math, device input, the real transport and rendering are supplied
//! through the traits in [`integration`] and [`transport`].
//!
//! ## Example
//!
//! ```rust
//! use tether_net::{LoopbackSession, NetworkConditions, ScriptedSampler, SyncConfig};
//! use tether_net::protocol::Inputs;
//!
//! let config = SyncConfig::default();
//! let sampler = ScriptedSampler::repeating(Inputs::movement(1.0, 0.0), 25);
//! let mut session = LoopbackSession::new(config, NetworkConditions::GOOD, sampler, 7);
//! session.run(100);
//! session.settle(100);
//! assert!(session.owner_error() < 1e-3);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod authority;
pub mod config;
pub mod error;
pub mod integration;
pub mod interpolation;
pub mod prediction;
pub mod protocol;
pub mod role;
pub mod simulation;
pub mod snapshot;
pub mod transport;

// Re-exports for convenience
pub use authority::{AuthorityEngine, HostEngine, TickLoop};
pub use config::{KinematicsConfig, SyncConfig};
pub use error::{ConfigError, SyncError, SyncResult, TransportError, WireError};
pub use integration::{
    InputSampler, Kinematics, NetworkedEntity, PoseSink, RecordingSink, ScriptedSampler,
    WalkerKinematics,
};
pub use interpolation::InterpolationEngine;
pub use prediction::{InputQueue, PredictionEngine, ReconciliationResult};
pub use protocol::{InputCommand, Inputs, Packet, Results};
pub use role::PeerRole;
pub use simulation::{LoopbackSession, LossyLink, NetworkConditions};
pub use snapshot::{ResultBuffer, SnapshotThrottle, Watermark};
pub use transport::{Channel, ChannelTransport, Envelope, Mailbox, RecordingTransport, Transport};

/// Default simulation tick rate (updates per second).
///
/// At 50Hz, each tick is 20ms.
pub const DEFAULT_TICK_RATE: u32 = 50;

/// Default seconds between two snapshot sends on the unreliable channel.
pub const DEFAULT_SNAPSHOT_SEND_INTERVAL: f32 = 0.05;

/// Maximum number of buffered inputs per entity.
pub const INPUT_QUEUE_CAPACITY: usize = 100;

/// Default number of snapshots an observer keeps before evicting the oldest.
pub const RESULT_BUFFER_CAPACITY: usize = 64;
