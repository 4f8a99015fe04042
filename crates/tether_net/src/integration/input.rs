//! Device input mapping and scripted input sources.

use crate::integration::InputSampler;
use crate::protocol::Inputs;

/// Default mouse sensitivity, degrees per second per unit of mouse axis.
pub const DEFAULT_LOOK_SENSITIVITY: f32 = 100.0;

/// Snaps an analog axis to a digital one: any positive value becomes 1, any
/// negative value -1, zero stays zero.
#[inline]
#[must_use]
pub fn round_to_largest(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Raw device axes for one frame, as read from the platform.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawAxes {
    /// Strafe axis (keyboard A/D or stick X).
    pub horizontal: f32,
    /// Walk axis (keyboard W/S or stick Y).
    pub vertical: f32,
    /// Mouse delta X.
    pub mouse_x: f32,
    /// Mouse delta Y.
    pub mouse_y: f32,
}

/// Turns [`RawAxes`] into [`Inputs`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMapping {
    /// Multiplier applied to mouse deltas.
    pub look_sensitivity: f32,
}

impl AxisMapping {
    /// Maps one frame of device input.
    ///
    /// Movement is digitized with [`round_to_largest`]. Mouse Y is inverted
    /// so pushing the mouse away looks up.
    #[must_use]
    pub fn map(&self, axes: RawAxes) -> Inputs {
        Inputs::new(
            round_to_largest(axes.vertical),
            round_to_largest(axes.horizontal),
            axes.mouse_x * self.look_sensitivity,
            -axes.mouse_y * self.look_sensitivity,
        )
    }
}

impl Default for AxisMapping {
    fn default() -> Self {
        Self {
            look_sensitivity: DEFAULT_LOOK_SENSITIVITY,
        }
    }
}

/// Plays back a fixed list of inputs, one per tick, then idles.
///
/// Used by the demo binary, benchmarks and tests.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSampler {
    script: Vec<Inputs>,
    cursor: usize,
}

impl ScriptedSampler {
    /// Creates a sampler from an explicit script.
    #[must_use]
    pub fn new(script: Vec<Inputs>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Repeats `inputs` for `ticks` ticks.
    #[must_use]
    pub fn repeating(inputs: Inputs, ticks: usize) -> Self {
        Self::new(vec![inputs; ticks])
    }

    /// Appends `inputs` for another `ticks` ticks.
    #[must_use]
    pub fn then(mut self, inputs: Inputs, ticks: usize) -> Self {
        self.script.extend(std::iter::repeat(inputs).take(ticks));
        self
    }

    /// Returns true once every scripted input has been handed out.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.script.len()
    }

    /// Ticks left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len().saturating_sub(self.cursor)
    }
}

impl InputSampler for ScriptedSampler {
    fn sample_inputs(&mut self) -> Inputs {
        let inputs = self.script.get(self.cursor).copied().unwrap_or_default();
        self.cursor = self.cursor.saturating_add(1);
        inputs
    }
}
