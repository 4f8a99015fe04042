//! # Packet Definitions
//!
//! All payload types are `Copy` and fixed-size, so they can be written to and
//! read from the wire with a single `bytemuck` copy.

use bytemuck::{Pod, Zeroable};
use tether_core::{Orientation, Pose, Position};

/// One tick of player intent.
///
/// Produced once per tick by the controlling peer. `forward` and `sides` are
/// expected in `[-1, 1]`; the authority clamps them on ingestion.
///
/// Size: 20 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Inputs {
    /// Forward/backward axis.
    pub forward: f32,
    /// Strafe axis.
    pub sides: f32,
    /// Vertical look rate.
    pub yaw: f32,
    /// Horizontal turn rate.
    pub pitch: f32,
    /// Simulation time the input was sampled at, in seconds.
    pub timestamp: f32,
}

impl Inputs {
    /// Size in bytes.
    pub const SIZE: usize = 20;

    /// Creates an unstamped input.
    #[inline]
    #[must_use]
    pub const fn new(forward: f32, sides: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            forward,
            sides,
            yaw,
            pitch,
            timestamp: 0.0,
        }
    }

    /// Creates a movement-only input.
    #[inline]
    #[must_use]
    pub const fn movement(forward: f32, sides: f32) -> Self {
        Self::new(forward, sides, 0.0, 0.0)
    }

    /// Creates a rotation-only input.
    #[inline]
    #[must_use]
    pub const fn rotation(pitch: f32, yaw: f32) -> Self {
        Self::new(0.0, 0.0, pitch, yaw)
    }

    /// Returns a copy stamped with `timestamp`.
    #[inline]
    #[must_use]
    pub const fn stamped(mut self, timestamp: f32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns true if either movement axis is non-zero.
    #[inline]
    #[must_use]
    pub fn has_movement(&self) -> bool {
        self.forward != 0.0 || self.sides != 0.0
    }

    /// Returns true if either rotation axis is non-zero.
    #[inline]
    #[must_use]
    pub fn has_rotation(&self) -> bool {
        self.pitch != 0.0 || self.yaw != 0.0
    }

    /// Returns true if every axis is zero.
    #[inline]
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        !self.has_movement() && !self.has_rotation()
    }

    /// Returns a copy with the movement axes clamped to `[-1, 1]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            forward: self.forward.clamp(-1.0, 1.0),
            sides: self.sides.clamp(-1.0, 1.0),
            ..self
        }
    }
}

/// One authoritative simulation outcome.
///
/// Only the authority produces these. The timestamp is copied from the input
/// that caused it, not from a wall clock.
///
/// Size: 36 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Results {
    /// Authoritative position.
    pub position: Position,
    /// Authoritative orientation.
    pub orientation: Orientation,
    /// Timestamp of the input this result was computed from.
    pub timestamp: f32,
}

impl Results {
    /// Size in bytes.
    pub const SIZE: usize = 36;

    /// Creates a result from a pose.
    #[inline]
    #[must_use]
    pub const fn new(pose: Pose, timestamp: f32) -> Self {
        Self {
            position: pose.position,
            orientation: pose.orientation,
            timestamp,
        }
    }

    /// The pose this result carries.
    #[inline]
    #[must_use]
    pub const fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    /// Returns true if every field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite() && self.timestamp.is_finite()
    }
}

/// Rotation-only command payload.
///
/// Size: 12 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RotationInput {
    /// Horizontal turn rate.
    pub pitch: f32,
    /// Vertical look rate.
    pub yaw: f32,
    /// Sample time.
    pub timestamp: f32,
}

/// Movement-only command payload.
///
/// Size: 12 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MovementInput {
    /// Forward/backward axis.
    pub forward: f32,
    /// Strafe axis.
    pub sides: f32,
    /// Sample time.
    pub timestamp: f32,
}

/// Combined movement and rotation command payload.
///
/// Size: 20 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MovementRotationInput {
    /// Forward/backward axis.
    pub forward: f32,
    /// Strafe axis.
    pub sides: f32,
    /// Horizontal turn rate.
    pub pitch: f32,
    /// Vertical look rate.
    pub yaw: f32,
    /// Sample time.
    pub timestamp: f32,
}

/// A command from the owner to the authority, in its smallest wire shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputCommand {
    /// Only rotation axes were non-zero.
    Rotation(RotationInput),
    /// Only movement axes were non-zero.
    Movement(MovementInput),
    /// Both were non-zero.
    MovementRotation(MovementRotationInput),
}

impl InputCommand {
    /// Picks the minimal variant for `inputs`.
    ///
    /// Returns `None` when every axis is zero: nothing is sent for idle ticks.
    #[must_use]
    pub fn from_inputs(inputs: &Inputs) -> Option<Self> {
        match (inputs.has_movement(), inputs.has_rotation()) {
            (false, false) => None,
            (true, false) => Some(Self::Movement(MovementInput {
                forward: inputs.forward,
                sides: inputs.sides,
                timestamp: inputs.timestamp,
            })),
            (false, true) => Some(Self::Rotation(RotationInput {
                pitch: inputs.pitch,
                yaw: inputs.yaw,
                timestamp: inputs.timestamp,
            })),
            (true, true) => Some(Self::MovementRotation(MovementRotationInput {
                forward: inputs.forward,
                sides: inputs.sides,
                pitch: inputs.pitch,
                yaw: inputs.yaw,
                timestamp: inputs.timestamp,
            })),
        }
    }

    /// Expands back to a full [`Inputs`], missing axes set to zero.
    ///
    /// Values are passed through unclamped; see [`Inputs::clamped`].
    #[must_use]
    pub const fn to_inputs(self) -> Inputs {
        match self {
            Self::Rotation(r) => Inputs::rotation(r.pitch, r.yaw).stamped(r.timestamp),
            Self::Movement(m) => Inputs::movement(m.forward, m.sides).stamped(m.timestamp),
            Self::MovementRotation(c) => {
                Inputs::new(c.forward, c.sides, c.pitch, c.yaw).stamped(c.timestamp)
            }
        }
    }

    /// Sample time of the command.
    #[must_use]
    pub const fn timestamp(&self) -> f32 {
        match self {
            Self::Rotation(r) => r.timestamp,
            Self::Movement(m) => m.timestamp,
            Self::MovementRotation(c) => c.timestamp,
        }
    }

    /// Wire type of this variant.
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        match self {
            Self::Rotation(_) => PacketType::RotationInput,
            Self::Movement(_) => PacketType::MovementInput,
            Self::MovementRotation(_) => PacketType::MovementRotationInput,
        }
    }
}

/// Types of packets in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Owner -> Authority: rotation-only command.
    RotationInput = 0,
    /// Owner -> Authority: movement-only command.
    MovementInput = 1,
    /// Owner -> Authority: movement and rotation command.
    MovementRotationInput = 2,
    /// Authority -> everyone: authoritative snapshot.
    Snapshot = 3,
}

impl PacketType {
    /// Decodes a type byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::RotationInput),
            1 => Some(Self::MovementInput),
            2 => Some(Self::MovementRotationInput),
            3 => Some(Self::Snapshot),
            _ => None,
        }
    }
}

/// A decoded packet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Packet {
    /// Input command for the authority.
    Command(InputCommand),
    /// Authoritative snapshot.
    Snapshot(Results),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_sizes() {
        assert_eq!(std::mem::size_of::<Inputs>(), Inputs::SIZE);
        assert_eq!(std::mem::size_of::<Results>(), Results::SIZE);
        assert_eq!(std::mem::size_of::<RotationInput>(), 12);
        assert_eq!(std::mem::size_of::<MovementInput>(), 12);
        assert_eq!(std::mem::size_of::<MovementRotationInput>(), 20);
    }

    #[test]
    fn test_minimal_command_shape() {
        assert_eq!(InputCommand::from_inputs(&Inputs::default()), None);

        let movement = InputCommand::from_inputs(&Inputs::movement(1.0, 0.0)).unwrap();
        assert_eq!(movement.packet_type(), PacketType::MovementInput);

        let rotation = InputCommand::from_inputs(&Inputs::rotation(0.0, -3.0)).unwrap();
        assert_eq!(rotation.packet_type(), PacketType::RotationInput);

        let both = InputCommand::from_inputs(&Inputs::new(0.0, -1.0, 2.0, 0.0)).unwrap();
        assert_eq!(both.packet_type(), PacketType::MovementRotationInput);
    }

    #[test]
    fn test_command_expands_with_zeroed_axes() {
        let inputs = Inputs::rotation(12.0, -4.0).stamped(1.5);
        let expanded = InputCommand::from_inputs(&inputs).unwrap().to_inputs();
        assert_eq!(expanded, inputs);
        assert_eq!(expanded.forward, 0.0);
        assert!((InputCommand::from_inputs(&inputs).unwrap().timestamp() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_clamped_only_touches_movement() {
        let raw = Inputs::new(7.0, -3.0, 250.0, -250.0);
        let clamped = raw.clamped();
        assert_eq!(clamped.forward, 1.0);
        assert_eq!(clamped.sides, -1.0);
        assert_eq!(clamped.pitch, 250.0);
        assert_eq!(clamped.yaw, -250.0);
    }

    #[test]
    fn test_trivial_detection() {
        assert!(Inputs::default().stamped(3.0).is_trivial());
        assert!(!Inputs::movement(0.0, 0.1).is_trivial());
        assert!(!Inputs::rotation(0.0, 0.1).is_trivial());
    }
}
