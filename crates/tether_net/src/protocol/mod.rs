//! # Network Protocol
//!
//! Value types exchanged between peers and their binary encoding.
//!
//! ## Packet Structure
//!
//! ```text
//! ┌────────────┬──────────────────────────────────────────────┐
//! │ Type (1)   │ Payload (Pod, little-endian f32 fields)      │
//! ├────────────┼──────────────────────────────────────────────┤
//! │ 0 rotation │ pitch, yaw, timestamp                  (12)  │
//! │ 1 movement │ forward, sides, timestamp              (12)  │
//! │ 2 both     │ forward, sides, pitch, yaw, timestamp  (20)  │
//! │ 3 snapshot │ position(16), orientation(16), time    (36)  │
//! └────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Commands travel on the reliable channel and use the smallest variant that
//! carries the non-zero axes. Snapshots travel on the unreliable channel.

mod packets;
mod serialization;

pub use packets::{
    InputCommand, Inputs, MovementInput, MovementRotationInput, Packet, PacketType, Results,
    RotationInput,
};
pub use serialization::{PacketDeserializer, PacketSerializer, MAX_BUFFER_SIZE};
