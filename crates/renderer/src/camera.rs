//! Perspective camera.

use engine_core::Transform;
use glam::{Mat4, Vec3};

/// Perspective camera with configurable FOV and clipping planes.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera transform (position and rotation).
    pub transform: Transform,
    /// Field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov_degrees: 90.0,
            near: 0.01,
            far: 100.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    /// Create a new camera at the given position.
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Get the view matrix.
    ///
    /// Built from the full rotation rather than a world-up vector: on a planet the
    /// camera's up follows the surface normal.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.transform.rotation, self.transform.position).inverse()
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get camera position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Get camera forward direction.
    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    /// Get camera up direction.
    pub fn up(&self) -> Vec3 {
        self.transform.up()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_moves_camera_to_origin() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 3.0));
        camera.transform.look_at(Vec3::ZERO, Vec3::Y);
        let eye_in_view = camera.view_matrix().transform_point3(camera.position());
        assert!(eye_in_view.length() < 1e-5);
        let target_in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((target_in_view - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-4);
    }
}
