//! Train follower: locomotive and wagons projected onto the recorded path.
//!
//! Bodies store no motion of their own. Each frame every body is placed at a fixed
//! straight-line distance behind the tip by interpolating between the two history
//! samples that bracket that distance.

use engine_core::{Quat, Spatial, Transform, Vec3};
use renderer::{NodeId, SceneGraph};

use crate::history::PoseHistory;

pub const WAGON_COUNT: usize = 4;
/// Distance from the tip to the locomotive.
pub const DISTANCE_TO_TIP: f32 = 2.0;
/// Extra distance per wagon.
pub const INTERWAGON_DISTANCE: f32 = 0.4;
/// Samples closer than this to the previous one are ignored.
pub const MIN_SAMPLE_DISTANCE: f32 = 0.1;
/// Hard cap on stored samples.
pub const MAX_HISTORY: usize = 10_000;
/// Samples kept behind the furthest one still in use.
pub const HISTORY_RETENTION: usize = 1000;

/// Trailing distance of body `index` (0 = locomotive).
pub fn target_distance(index: usize) -> f32 {
    DISTANCE_TO_TIP + INTERWAGON_DISTANCE * index as f32
}

/// Locomotive plus wagons following a pose history.
#[derive(Debug)]
pub struct Train {
    history: PoseHistory,
    /// Locomotive first, then wagons front to back.
    bodies: Vec<Transform>,
    nodes: Vec<NodeId>,
}

impl Train {
    pub fn new(scene: &mut impl SceneGraph, parent: NodeId) -> Self {
        let nodes = (0..=WAGON_COUNT).map(|_| scene.create_node(parent)).collect();
        Self {
            history: PoseHistory::new(MIN_SAMPLE_DISTANCE).with_capacity_limit(MAX_HISTORY),
            bodies: vec![Transform::default(); WAGON_COUNT + 1],
            nodes,
        }
    }

    /// Record a tip sample. Near-duplicates and samples past the cap are dropped.
    pub fn add_point(&mut self, position: Vec3, rotation: Quat) -> bool {
        self.history.push(position, rotation)
    }

    pub fn history(&self) -> &PoseHistory {
        &self.history
    }

    pub fn locomotive(&self) -> &Transform {
        &self.bodies[0]
    }

    pub fn wagons(&self) -> &[Transform] {
        &self.bodies[1..]
    }

    /// Scene node of the locomotive.
    pub fn locomotive_node(&self) -> NodeId {
        self.nodes[0]
    }

    /// Scene nodes of the wagons, front to back.
    pub fn wagon_nodes(&self) -> &[NodeId] {
        &self.nodes[1..]
    }

    /// Front of the train used for collision checks.
    pub fn tip_position(&self) -> Vec3 {
        self.bodies[0].position
    }

    /// Direction the locomotive is facing.
    pub fn direction(&self) -> Vec3 {
        self.bodies[0].forward()
    }

    /// Latest history index whose sample lies at least `target` away from `tip`,
    /// scanning from the newest sample backwards. Falls back to the newest sample.
    fn index_for_distance_to_tip(&self, tip: Vec3, target: f32) -> Option<usize> {
        let last = self.history.len().checked_sub(1)?;
        let found = self
            .history
            .iter()
            .enumerate()
            .rev()
            .find(|(_, pose)| pose.position.distance(tip) >= target)
            .map(|(i, _)| i);
        Some(found.unwrap_or(last))
    }

    /// Place `body` `target` behind `tip`. Returns the history index used.
    pub fn set_position_of<T: Spatial>(&self, body: &mut T, tip: Vec3, target: f32) -> Option<usize> {
        let index = self.index_for_distance_to_tip(tip, target)?;
        let further = *self.history.get(index)?;
        let mut position = further.position;
        let mut rotation = further.rotation;

        if let Some(closer) = self.history.get(index + 1) {
            let closer_distance = closer.position.distance(tip);
            let further_distance = further.position.distance(tip);
            if further_distance >= target && closer_distance < target {
                let t = (target - closer_distance) / (further_distance - closer_distance);
                // Lerp the chord, then push back out to the lerped radius so bodies stay on
                // the surface.
                let radius = closer.position.length() + (further.position.length() - closer.position.length()) * t;
                position = closer.position.lerp(further.position, t).normalize_or_zero() * radius;
                rotation = closer.rotation.slerp(further.rotation, t);
            }
        }

        body.set_position(position);
        body.set_rotation(rotation);
        Some(index)
    }

    /// Place every body behind `tip` and prune samples no body can reach any more.
    pub fn set_position(&mut self, tip: Vec3) {
        if self.history.is_empty() {
            return;
        }
        let mut bodies = std::mem::take(&mut self.bodies);
        let mut min_used_index = self.history.len() - 1;
        for (i, body) in bodies.iter_mut().enumerate() {
            if let Some(index) = self.set_position_of(body, tip, target_distance(i)) {
                min_used_index = min_used_index.min(index);
            }
        }
        self.bodies = bodies;

        if min_used_index > HISTORY_RETENTION {
            let pruned = min_used_index - HISTORY_RETENTION;
            self.history.prune_front(pruned);
            log::trace!("Pruned {} train samples, {} left", pruned, self.history.len());
        }
    }

    /// Extend the path straight past its last segment and follow it.
    ///
    /// Used for the end-of-game launch: no player input is needed to keep moving.
    pub fn launch_into_space(&mut self) -> bool {
        let n = self.history.len();
        if n < 2 {
            return false;
        }
        let (Some(p0), Some(p1)) = (self.history.get(n - 2), self.history.get(n - 1)) else {
            return false;
        };
        let next = p1.position * 2.0 - p0.position;
        let rotation = p1.rotation;
        if !self.history.push_unchecked(next, rotation) {
            return false;
        }
        self.set_position(next);
        true
    }

    /// Write body transforms into their scene nodes.
    pub fn apply_to_scene(&self, scene: &mut impl SceneGraph) {
        for (node, body) in self.nodes.iter().zip(self.bodies.iter()) {
            scene.set_transform(*node, *body);
        }
    }
}
