//! Locomotive smoke: a small pool of billboard puffs that rise off the planet and fade.

use std::collections::VecDeque;

use engine_core::{Quat, Transform, Vec3};
use renderer::{Material, MeshData, NodeId, SceneGraph};

/// Puffs alive at once; the oldest is recycled beyond this.
pub const MAX_PUFFS: usize = 20;
/// Emitter travel required between two puffs.
pub const SPAWN_DISTANCE: f32 = 0.05;
/// Chimney position in locomotive-local space.
pub const EMITTER_OFFSET: Vec3 = Vec3::new(0.0, 0.12, -0.08);

const PUFF_SIZE: f32 = 0.05;
const RISE_SPEED: f32 = 0.15;
const GROWTH_RATE: f32 = 1.2;
const FADE_RATE: f32 = 0.8;
const SMOKE_COLOR: u32 = 0xdddddd;

/// A single smoke puff.
#[derive(Debug, Clone)]
pub struct SmokePuff {
    node: NodeId,
    pub position: Vec3,
    pub rotation: Quat,
    /// Uniform scale.
    pub size: f32,
    pub opacity: f32,
}

/// Distance-gated smoke emitter.
#[derive(Debug)]
pub struct SmokeTrail {
    container: NodeId,
    puffs: VecDeque<SmokePuff>,
    last_spawn: Option<Vec3>,
}

impl SmokeTrail {
    pub fn new(scene: &mut impl SceneGraph, parent: NodeId) -> Self {
        Self {
            container: scene.create_node(parent),
            puffs: VecDeque::with_capacity(MAX_PUFFS + 1),
            last_spawn: None,
        }
    }

    pub fn puffs(&self) -> impl ExactSizeIterator<Item = &SmokePuff> {
        self.puffs.iter()
    }

    /// World position of the chimney for a locomotive transform.
    pub fn emitter_position(locomotive: &Transform) -> Vec3 {
        locomotive.position + locomotive.rotation * EMITTER_OFFSET
    }

    /// Emit if the locomotive moved far enough, then age every puff.
    pub fn update(
        &mut self,
        scene: &mut impl SceneGraph,
        locomotive: &Transform,
        camera_position: Vec3,
        dt: f32,
    ) {
        let emitter = Self::emitter_position(locomotive);
        let moved = self
            .last_spawn
            .map_or(true, |last| last.distance(emitter) >= SPAWN_DISTANCE);
        if moved {
            self.spawn(scene, emitter);
        }

        for puff in &mut self.puffs {
            // Drift away from the planet centre.
            puff.position += puff.position.normalize_or_zero() * RISE_SPEED * dt;
            puff.size += GROWTH_RATE * dt;
            puff.opacity = (puff.opacity - FADE_RATE * dt).max(0.0);
            puff.rotation = billboard_rotation(puff.position, camera_position, locomotive.up());
            scene.set_transform(
                puff.node,
                Transform {
                    position: puff.position,
                    rotation: puff.rotation,
                    scale: Vec3::splat(puff.size),
                },
            );
            scene.set_opacity(puff.node, puff.opacity);
        }

        // Fully faded puffs go now instead of waiting to be recycled.
        while let Some(index) = self.puffs.iter().position(|p| p.opacity <= 0.0) {
            if let Some(puff) = self.puffs.remove(index) {
                scene.remove_node(puff.node);
            }
        }
    }

    fn spawn(&mut self, scene: &mut impl SceneGraph, position: Vec3) {
        let node = scene.create_node(self.container);
        scene.set_mesh(
            node,
            MeshData::billboard_quad(PUFF_SIZE),
            Material::from_hex(SMOKE_COLOR).transparent(),
        );
        self.puffs.push_back(SmokePuff {
            node,
            position,
            rotation: Quat::IDENTITY,
            size: 1.0,
            opacity: 1.0,
        });
        self.last_spawn = Some(position);
        while self.puffs.len() > MAX_PUFFS {
            if let Some(old) = self.puffs.pop_front() {
                scene.remove_node(old.node);
            }
        }
    }
}

/// Rotation turning a +Z-facing quad at `position` toward `camera`.
fn billboard_rotation(position: Vec3, camera: Vec3, up: Vec3) -> Quat {
    let view = (position - camera).normalize_or_zero();
    // An up parallel to the view leaves the roll undefined; any perpendicular will do.
    let up = if view.dot(up.normalize_or_zero()).abs() > 0.999 {
        view.any_orthonormal_vector()
    } else {
        up
    };
    // look_at aims -Z, so aim away from the camera.
    let mut t = Transform::from_position(position);
    t.look_at(position * 2.0 - camera, up);
    t.rotation
}
