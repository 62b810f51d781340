//! Chase camera that rides behind the tip with the planet normal as its up axis.

use engine_core::Vec3;
use renderer::Camera;
use serde::{Deserialize, Serialize};

use crate::player::Player;

/// Height above the tip the camera looks at.
const LOOK_HEIGHT: f32 = 0.1;
/// Debug orbit, in planet radii.
const DEBUG_ORBIT: f32 = 3.0;

/// How the eye tracks its ideal position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum CameraMode {
    /// Eye snaps to the ideal position every frame.
    #[default]
    Follow,
    /// Eye stays put until the ideal position gets further than `max_distance`, then is
    /// dragged along.
    KeepWithin { max_distance: f32 },
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    pub mode: CameraMode,
    /// Distance behind the tip.
    pub distance: f32,
    /// Lift along the surface normal.
    pub height: f32,
    planet_radius: f32,
    debug: bool,
    eye: Option<Vec3>,
    camera: Camera,
}

impl CameraRig {
    pub fn new(mode: CameraMode, distance: f32, height: f32, planet_radius: f32) -> Self {
        Self {
            mode,
            distance,
            height,
            planet_radius,
            debug: false,
            eye: None,
            camera: Camera::default(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Current eye position.
    pub fn eye(&self) -> Vec3 {
        self.camera.transform.position
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
        log::info!("Debug camera {}", if self.debug { "on" } else { "off" });
    }

    /// Eye position with no lag for the player's current pose.
    pub fn ideal_eye(&self, player: &Player) -> Vec3 {
        let up = player.absolute_position().normalize_or_zero();
        player.ideal_camera_position(self.distance) + up * self.height
    }

    /// Move the camera for this frame.
    pub fn update(&mut self, player: &Player) {
        if self.debug {
            let eye = Vec3::new(0.0, 0.0, self.planet_radius * DEBUG_ORBIT);
            self.camera.transform.position = eye;
            self.camera.transform.look_at(Vec3::ZERO, Vec3::Y);
            return;
        }

        let ideal = self.ideal_eye(player);
        let eye = match (self.mode, self.eye) {
            (CameraMode::KeepWithin { max_distance }, Some(previous)) => {
                keep_within(previous, ideal, max_distance)
            }
            _ => ideal,
        };
        self.eye = Some(eye);

        let tip = player.absolute_position();
        let up = tip.normalize_or_zero();
        self.camera.transform.position = eye;
        self.camera.transform.look_at(tip + up * LOOK_HEIGHT, up);
    }
}

/// Pull `eye` toward `target` just enough to be within `max_distance` of it.
pub fn keep_within(eye: Vec3, target: Vec3, max_distance: f32) -> Vec3 {
    let offset = eye - target;
    if offset.length() <= max_distance {
        eye
    } else {
        target + offset.normalize_or_zero() * max_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn follow_sits_behind_and_above_tip() {
        let player = Player::new(10.0);
        let mut rig = CameraRig::new(CameraMode::Follow, 1.0, 0.5, 10.0);
        rig.update(&player);
        assert!((rig.eye() - Vec3::new(0.0, 10.5, 1.0)).length() < EPS);
        // Looks toward the tip, i.e. mostly along -Z.
        assert!(rig.camera().forward().z < -0.5);
    }

    #[test]
    fn keep_within_leaves_close_eye_alone() {
        let eye = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(keep_within(eye, Vec3::new(0.0, 1.0, 0.2), 0.5), eye);
    }

    #[test]
    fn keep_within_clamps_to_max_distance() {
        let eye = keep_within(Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0), 1.0);
        assert!((eye - Vec3::new(0.0, 0.0, -2.0)).length() < EPS);
    }

    /// The lagging eye never falls further than `max_distance` behind the ideal one.
    #[test]
    fn keep_within_mode_trails_player() {
        let mut player = Player::new(10.0);
        let mut rig = CameraRig::new(CameraMode::KeepWithin { max_distance: 0.3 }, 1.0, 0.5, 10.0);
        rig.update(&player);
        for _ in 0..50 {
            for _ in 0..20 {
                player.update(0.001);
            }
            rig.update(&player);
            assert!(rig.eye().distance(rig.ideal_eye(&player)) <= 0.3 + EPS);
        }
    }

    #[test]
    fn debug_camera_watches_planet() {
        let player = Player::new(10.0);
        let mut rig = CameraRig::new(CameraMode::Follow, 1.0, 0.5, 10.0);
        rig.toggle_debug();
        rig.update(&player);
        assert!((rig.eye() - Vec3::new(0.0, 0.0, 30.0)).length() < EPS);
        assert!((rig.camera().forward() - Vec3::NEG_Z).length() < EPS);
        rig.toggle_debug();
        assert!(!rig.is_debug());
    }
}
