//! # Pose Types
//!
//! Poses are pure data containers. They must be `Copy` and fixed-size so they
//! can be stamped into snapshots and written straight onto the wire.
//!
//! The arithmetic (lerp, slerp, euler conversion) is delegated to `glam`; the
//! structs here only fix the memory layout.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Quat, Vec3};

/// A 3D position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// X coordinate in world space.
    pub x: f32,
    /// Y coordinate in world space.
    pub y: f32,
    /// Z coordinate in world space.
    pub z: f32,
    /// Padding for alignment (ensures 16-byte alignment for SIMD).
    pub _padding: f32,
}

impl Position {
    /// The world origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            _padding: 0.0,
        }
    }

    /// Returns the squared distance to another position.
    ///
    /// This avoids the sqrt call for distance comparisons.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Returns the distance to another position.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Linear interpolation towards `target`. `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, target: Self, t: f32) -> Self {
        self.to_vec3().lerp(target.to_vec3(), t.clamp(0.0, 1.0)).into()
    }

    /// Returns true if every coordinate is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Converts to a `glam` vector.
    #[inline]
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

const SAME_ROTATION_EPSILON: f32 = 1e-6;

/// A rotation in world space, stored as a unit quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Orientation {
    /// Quaternion X.
    pub x: f32,
    /// Quaternion Y.
    pub y: f32,
    /// Quaternion Z.
    pub z: f32,
    /// Quaternion W.
    pub w: f32,
}

impl Orientation {
    /// No rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Builds an orientation from euler angles in degrees.
    ///
    /// `vertical` turns around the X axis, `horizontal` around the Y axis and
    /// `roll` around Z; they are applied roll first, then vertical, then
    /// horizontal.
    #[must_use]
    pub fn from_euler_degrees(vertical: f32, horizontal: f32, roll: f32) -> Self {
        Quat::from_euler(
            EulerRot::YXZ,
            horizontal.to_radians(),
            vertical.to_radians(),
            roll.to_radians(),
        )
        .into()
    }

    /// Returns `(vertical, horizontal, roll)` in degrees, inverse of
    /// [`Orientation::from_euler_degrees`].
    #[must_use]
    pub fn euler_degrees(self) -> (f32, f32, f32) {
        let (horizontal, vertical, roll) = self.to_quat().to_euler(EulerRot::YXZ);
        (vertical.to_degrees(), horizontal.to_degrees(), roll.to_degrees())
    }

    /// Spherical interpolation towards `target`. `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn slerp(self, target: Self, t: f32) -> Self {
        self.to_quat()
            .slerp(target.to_quat(), t.clamp(0.0, 1.0))
            .normalize()
            .into()
    }

    /// Angle between two orientations, in degrees.
    ///
    /// Orientations whose dot product is within rounding of 1 are the same
    /// rotation and report exactly zero.
    #[must_use]
    pub fn angle_to(self, other: Self) -> f32 {
        let dot = self.to_quat().dot(other.to_quat()).abs().min(1.0);
        if dot > 1.0 - SAME_ROTATION_EPSILON {
            return 0.0;
        }
        (dot.acos() * 2.0).to_degrees()
    }

    /// Rotates a local-space vector into world space.
    #[inline]
    #[must_use]
    pub fn rotate_vec3(self, v: Vec3) -> Vec3 {
        self.to_quat() * v
    }

    /// Returns true if every component is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// Converts to a `glam` quaternion.
    #[inline]
    #[must_use]
    pub const fn to_quat(self) -> Quat {
        Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Quat> for Orientation {
    fn from(q: Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

/// Position and orientation of one simulated entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Pose {
    /// Where the entity is.
    pub position: Position,
    /// Which way it faces.
    pub orientation: Orientation,
}

impl Pose {
    /// Creates a new pose.
    #[inline]
    #[must_use]
    pub const fn new(position: Position, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Lerps the position and slerps the orientation towards `target`.
    ///
    /// `t` is clamped to `[0, 1]`, so the result always lies on the segment
    /// between `self` and `target`.
    #[must_use]
    pub fn interpolate(self, target: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(target.position, t),
            orientation: self.orientation.slerp(target.orientation, t),
        }
    }

    /// Returns true if moving from `previous` to `self` is observable: any
    /// positional distance or any rotation angle.
    #[must_use]
    pub fn changed_from(self, previous: Self) -> bool {
        self.position.distance(previous.position) > 0.0
            || self.orientation.angle_to(previous.orientation) > 0.0
    }
}
