//! Rigid transforms and rotation about an arbitrary world-space axis.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Camera-style transform at `position` looking straight down (-Y).
    pub fn looking_down(position: Vec3) -> Self {
        Self::new(position, Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2))
    }

    /// Local -Z in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Rotate `transform` by `angle` radians about the line through `point`
/// along `axis`. Both orientation and position are rotated, as if the object
/// had no rotated parent. A zero axis leaves the transform unchanged.
pub fn rotate_around_world_axis(transform: Transform, point: Vec3, axis: Vec3, angle: f32) -> Transform {
    let Some(axis) = axis.try_normalize() else {
        return transform;
    };
    let q = Quat::from_axis_angle(axis, angle);
    Transform {
        position: q * (transform.position - point) + point,
        rotation: (q * transform.rotation).normalize(),
    }
}
