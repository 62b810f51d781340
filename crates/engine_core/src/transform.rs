//! Transform component and utilities for spatial positioning.
//!
//! A [`Transform`] with unit scale doubles as a *pose*: the (position, rotation) pair
//! recorded every simulation step by the locomotion model and consumed by the track
//! builder and the train follower.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// Position + orientation pair. Scale stays at one for poses.
pub type Pose = Transform;

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Compose a child transform expressed in this transform's local space.
    ///
    /// Matches parent-child matrix concatenation (`parent * child`) for uniform scale.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale * child.position),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get the right direction (positive X).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (positive Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Translate the transform by a delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate around an axis expressed in local space (post-multiplied).
    pub fn rotate_local(&mut self, axis: Vec3, angle: f32) {
        self.rotation = (self.rotation * Quat::from_axis_angle(axis, angle)).normalize();
    }

    /// Look at a target position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward.length_squared() > 0.0001 {
            self.rotation = Quat::from_mat4(&Mat4::look_at_rh(self.position, target, up)).inverse();
        }
    }
}

/// Rotate `from` toward `to` by at most `max_angle` radians. Never overshoots `to`.
pub fn rotate_towards(from: Quat, to: Quat, max_angle: f32) -> Quat {
    let angle = from.angle_between(to);
    if angle <= max_angle || angle <= f32::EPSILON {
        return to;
    }
    from.slerp(to, (max_angle / angle).clamp(0.0, 1.0)).normalize()
}

/// Narrow "anything with a pose" capability.
///
/// Track, train and scenery code only ever reads and writes position/rotation, so they
/// depend on this trait rather than on a full scene node type.
pub trait Spatial {
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn set_position(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Quat);

    fn pose(&self) -> Pose {
        Pose::from_position_rotation(self.position(), self.rotation())
    }
}

impl Spatial for Transform {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }
}

/// Raw transform data for GPU upload (instance data).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformRaw {
    pub model: [[f32; 4]; 4],
}

impl From<&Transform> for TransformRaw {
    fn from(transform: &Transform) -> Self {
        Self {
            model: transform.to_matrix().to_cols_array_2d(),
        }
    }
}

impl From<Transform> for TransformRaw {
    fn from(transform: Transform) -> Self {
        Self::from(&transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    /// Composition must agree with multiplying the model matrices.
    #[test]
    fn mul_transform_matches_matrix_concatenation() {
        let parent = Transform::from_position_rotation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
        );
        let child = Transform::from_position_rotation(
            Vec3::new(0.0, 1.5, -0.5),
            Quat::from_rotation_x(0.3),
        );
        let composed = parent.mul_transform(&child);
        let expected = parent.to_matrix() * child.to_matrix();
        let p = expected.transform_point3(Vec3::ZERO);
        assert!((composed.position - p).length() < 1e-5);
        let (_, r, _) = expected.to_scale_rotation_translation();
        assert!(composed.rotation.angle_between(r) < 1e-4);
    }

    #[test]
    fn rotate_towards_does_not_overshoot() {
        let from = Quat::IDENTITY;
        let to = Quat::from_rotation_z(FRAC_PI_2);
        let half = rotate_towards(from, to, 0.25);
        assert!((from.angle_between(half) - 0.25).abs() < 1e-4);
        let done = rotate_towards(from, to, 10.0);
        assert_eq!(done, to);
        let nearly = rotate_towards(from, to, FRAC_PI_2 - 1e-3);
        assert!(nearly.abs_diff_eq(to, 1e-3));
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut t = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        t.look_at(Vec3::ZERO, Vec3::Y);
        assert!((t.forward() - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
