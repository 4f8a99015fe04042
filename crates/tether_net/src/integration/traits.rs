//! # Integration Traits
//!
//! The narrow seams through which the host application plugs into the
//! synchronization engines.
//!
//! ```text
//! tether_net defines:         the application implements:
//! ┌──────────────────┐        ┌──────────────────────────┐
//! │ trait Kinematics │ ←───── │ walker, vehicle, drone   │
//! │ trait InputSampler│ ←──── │ keyboard, gamepad, AI    │
//! │ trait PoseSink   │ ←───── │ scene graph / renderer   │
//! └──────────────────┘        └──────────────────────────┘
//! ```
//!
//! None of these may block or allocate per call in a real integration; they
//! run inside the fixed tick.

use tether_core::{Orientation, Pose, Position};

use crate::protocol::Inputs;

// ============================================================================
// Movement
// ============================================================================

/// Movement rules for one kind of entity.
///
/// Implementations must be deterministic: the owner replays the same inputs
/// during reconciliation and has to land where the authority did.
pub trait Kinematics {
    /// Moves `current` by the given axes, expressed relative to `heading`.
    fn translate(&self, forward: f32, sides: f32, current: Position, heading: Orientation)
        -> Position;

    /// Turns `current` by the given rates.
    fn rotate(&self, pitch: f32, yaw: f32, current: Orientation) -> Orientation;

    /// Applies one tick of `inputs` to `pose`: rotation first, then
    /// translation along the new heading.
    fn apply(&self, inputs: &Inputs, pose: Pose) -> Pose {
        let orientation = self.rotate(inputs.pitch, inputs.yaw, pose.orientation);
        let position = self.translate(inputs.forward, inputs.sides, pose.position, orientation);
        Pose::new(position, orientation)
    }
}

impl<K: Kinematics + ?Sized> Kinematics for &K {
    fn translate(
        &self,
        forward: f32,
        sides: f32,
        current: Position,
        heading: Orientation,
    ) -> Position {
        (**self).translate(forward, sides, current, heading)
    }

    fn rotate(&self, pitch: f32, yaw: f32, current: Orientation) -> Orientation {
        (**self).rotate(pitch, yaw, current)
    }

    fn apply(&self, inputs: &Inputs, pose: Pose) -> Pose {
        (**self).apply(inputs, pose)
    }
}

// ============================================================================
// Input
// ============================================================================

/// Source of one [`Inputs`] record per tick for the locally owned entity.
///
/// The sampler does not stamp the record; the engine does.
pub trait InputSampler {
    /// Samples the controls for this tick.
    fn sample_inputs(&mut self) -> Inputs;
}

impl<F: FnMut() -> Inputs> InputSampler for F {
    fn sample_inputs(&mut self) -> Inputs {
        self()
    }
}

/// Sampler that never moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleSampler;

impl InputSampler for IdleSampler {
    fn sample_inputs(&mut self) -> Inputs {
        Inputs::default()
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// Receives the pose to display, once per tick.
pub trait PoseSink {
    /// Sets the displayed position.
    fn update_position(&mut self, position: Position);

    /// Sets the displayed orientation.
    fn update_orientation(&mut self, orientation: Orientation);
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl PoseSink for NullSink {
    fn update_position(&mut self, _position: Position) {}

    fn update_orientation(&mut self, _orientation: Orientation) {}
}

/// Sink that remembers every pose it was given. For tests and reports.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    /// Every position received, in order.
    pub positions: Vec<Position>,
    /// Every orientation received, in order.
    pub orientations: Vec<Orientation>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently displayed pose.
    #[must_use]
    pub fn last_pose(&self) -> Option<Pose> {
        Some(Pose::new(
            *self.positions.last()?,
            *self.orientations.last()?,
        ))
    }

    /// Number of position updates received.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.positions.len()
    }
}

impl PoseSink for RecordingSink {
    fn update_position(&mut self, position: Position) {
        self.positions.push(position);
    }

    fn update_orientation(&mut self, orientation: Orientation) {
        self.orientations.push(orientation);
    }
}
