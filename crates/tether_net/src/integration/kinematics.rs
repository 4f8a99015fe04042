//! Default movement strategy: a free-look walker.

use glam::Vec3;
use tether_core::{Orientation, Position};

use crate::config::{KinematicsConfig, SyncConfig};
use crate::integration::Kinematics;

/// First-person walker.
///
/// Movement axes are relative to where the walker faces and are capped at unit
/// length so diagonals are not faster. `pitch` turns left/right, `yaw` looks
/// up/down (clamped to the configured look limit). Both rates are in degrees
/// per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkerKinematics {
    move_speed: f32,
    look_limit: f32,
    tick_duration: f32,
}

impl WalkerKinematics {
    /// Creates a walker for a fixed tick of `tick_duration` seconds.
    #[must_use]
    pub const fn new(move_speed: f32, look_limit: f32, tick_duration: f32) -> Self {
        Self {
            move_speed,
            look_limit,
            tick_duration,
        }
    }

    /// Creates a walker from session configuration.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        let KinematicsConfig {
            move_speed,
            look_limit,
        } = config.kinematics;
        Self::new(move_speed, look_limit, config.tick_duration())
    }

    /// Distance covered by one tick of full input.
    #[must_use]
    pub fn step_length(&self) -> f32 {
        self.move_speed * self.tick_duration
    }
}

impl Default for WalkerKinematics {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl Kinematics for WalkerKinematics {
    fn translate(
        &self,
        forward: f32,
        sides: f32,
        current: Position,
        heading: Orientation,
    ) -> Position {
        // Exact no-op keeps the dirty check quiet on idle ticks
        if forward == 0.0 && sides == 0.0 {
            return current;
        }
        let local = Vec3::new(sides, 0.0, forward).clamp_length_max(1.0) * self.step_length();
        (current.to_vec3() + heading.rotate_vec3(local)).into()
    }

    fn rotate(&self, pitch: f32, yaw: f32, current: Orientation) -> Orientation {
        if pitch == 0.0 && yaw == 0.0 {
            return current;
        }
        let (vertical, horizontal, _) = current.euler_degrees();
        let horizontal = horizontal + pitch * self.tick_duration;
        let mut vertical = vertical + yaw * self.tick_duration;
        if vertical > 180.0 {
            vertical -= 360.0;
        }
        let vertical = vertical.clamp(-self.look_limit, self.look_limit);
        Orientation::from_euler_degrees(vertical, horizontal, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Inputs;
    use tether_core::Pose;

    fn walker() -> WalkerKinematics {
        WalkerKinematics::new(3.0, 89.0, 0.02)
    }

    #[test]
    fn test_forward_step() {
        let moved = walker().translate(1.0, 0.0, Position::ORIGIN, Orientation::IDENTITY);
        assert!((moved.z - 0.06).abs() < 1e-6);
        assert!(moved.x.abs() < 1e-6);
    }

    #[test]
    fn test_diagonal_is_not_faster() {
        let moved = walker().translate(1.0, 1.0, Position::ORIGIN, Orientation::IDENTITY);
        assert!((moved.distance(Position::ORIGIN) - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_movement_follows_heading() {
        let facing_right = Orientation::from_euler_degrees(0.0, 90.0, 0.0);
        let moved = walker().translate(1.0, 0.0, Position::ORIGIN, facing_right);
        assert!((moved.x - 0.06).abs() < 1e-5);
        assert!(moved.z.abs() < 1e-5);
    }

    #[test]
    fn test_turn_rate() {
        let turned = walker().rotate(100.0, 0.0, Orientation::IDENTITY);
        let (vertical, horizontal, _) = turned.euler_degrees();
        assert!((horizontal - 2.0).abs() < 1e-3);
        assert!(vertical.abs() < 1e-3);
    }

    #[test]
    fn test_look_is_clamped() {
        let kin = walker();
        let mut orientation = Orientation::IDENTITY;
        for _ in 0..20 {
            orientation = kin.rotate(0.0, 500.0, orientation);
        }
        let (vertical, _, _) = orientation.euler_degrees();
        assert!(vertical <= 89.0 + 1e-3);
        assert!(vertical > 80.0);
    }

    #[test]
    fn test_idle_input_is_exact_noop() {
        let pose = Pose::new(
            Position::new(1.5, 0.0, -2.0),
            Orientation::from_euler_degrees(12.0, 33.0, 0.0),
        );
        let after = walker().apply(&Inputs::default(), pose);
        assert_eq!(after, pose);
        assert!(!after.changed_from(pose));
    }

    #[test]
    fn test_deterministic() {
        let kin = walker();
        let inputs = Inputs::new(1.0, -1.0, 45.0, -10.0);
        let a = kin.apply(&inputs, Pose::default());
        let b = kin.apply(&inputs, Pose::default());
        assert_eq!(a, b);
    }
}
