//! Locomotion model: a pivot spinning at the planet centre with the tip on its +Y arm.
//!
//! Moving forward is a rotation of the pivot about its local lateral axis, so the tip
//! travels a great circle at the tip height. Steering yaws the pivot about its local
//! vertical axis.

use engine_core::{Pose, Quat, Transform, Vec3};

use crate::history::PoseHistory;

/// Entries kept in the recorded path.
pub const PATH_LENGTH: usize = 1000;

/// Default yaw applied per unit of forward rotation while steering.
pub const DEFAULT_TURN_RATE: f32 = 3.0;

/// Player controller: pivot hierarchy plus held steering intents.
#[derive(Debug, Clone)]
pub struct Player {
    /// Rotation-only pivot at the planet centre.
    pivot: Transform,
    /// Tip, in pivot-local space.
    tip: Transform,
    pub turn_rate: f32,
    is_go_left: bool,
    is_go_right: bool,
    path: PoseHistory,
}

impl Player {
    pub fn new(height: f32) -> Self {
        Self {
            pivot: Transform::default(),
            tip: Transform::from_position(Vec3::new(0.0, height, 0.0)),
            turn_rate: DEFAULT_TURN_RATE,
            is_go_left: false,
            is_go_right: false,
            path: PoseHistory::new(0.0),
        }
    }

    pub fn with_turn_rate(mut self, turn_rate: f32) -> Self {
        self.turn_rate = turn_rate;
        self
    }

    pub fn start_move_left(&mut self) {
        self.is_go_left = true;
    }

    pub fn start_move_right(&mut self) {
        self.is_go_right = true;
    }

    pub fn end_move_left(&mut self) {
        self.is_go_left = false;
    }

    pub fn end_move_right(&mut self) {
        self.is_go_right = false;
    }

    /// Signed steering input: +1 left, -1 right, 0 when none or both are held.
    pub fn steering(&self) -> f32 {
        match (self.is_go_left, self.is_go_right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// Advance by `step` radians of forward rotation.
    ///
    /// Callers keep `step` small (about 0.001) so downstream sampling stays dense.
    pub fn update(&mut self, step: f32) {
        self.pivot.rotate_local(Vec3::NEG_X, step);
        let steering = self.steering();
        if steering != 0.0 {
            self.pivot.rotate_local(Vec3::Y, steering * step * self.turn_rate);
        }
    }

    /// World-space tip transform.
    pub fn absolute_transform(&self) -> Transform {
        self.pivot.mul_transform(&self.tip)
    }

    pub fn absolute_position(&self) -> Vec3 {
        self.absolute_transform().position
    }

    pub fn absolute_rotation(&self) -> Quat {
        self.absolute_transform().rotation
    }

    pub fn absolute_pose(&self) -> Pose {
        let t = self.absolute_transform();
        Pose::from_position_rotation(t.position, t.rotation)
    }

    /// Unit direction of travel.
    pub fn direction(&self) -> Vec3 {
        self.absolute_transform().forward()
    }

    /// Camera anchor `distance` behind the tip along its forward axis.
    pub fn ideal_camera_position(&self, distance: f32) -> Vec3 {
        let forward = self.absolute_rotation() * Vec3::new(0.0, 0.0, -distance);
        self.absolute_position() - forward
    }

    /// Append the current tip pose to the recorded path, dropping the oldest beyond
    /// [`PATH_LENGTH`].
    pub fn record_path(&mut self) {
        let pose = self.absolute_pose();
        self.path.push_unchecked(pose.position, pose.rotation);
        if self.path.len() > PATH_LENGTH {
            self.path.prune_front(self.path.len() - PATH_LENGTH);
        }
    }

    pub fn path(&self) -> &PoseHistory {
        &self.path
    }

    /// Pivot transform, for attaching a visual hierarchy.
    pub fn pivot(&self) -> Transform {
        self.pivot
    }
}
