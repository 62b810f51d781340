//! Track builder: two extruded rails plus cross-ties, generated just behind the tip.
//!
//! Each part is fed the same (position, rotation) stream and keeps a sliding window of
//! scene nodes. The oldest node is removed once the window is full, so memory is
//! bounded by the caps and not by the distance travelled.

use std::collections::VecDeque;

use engine_core::{Quat, Transform, Vec3};
use renderer::{Material, MeshData, NodeId, SceneGraph, Vertex};

/// Rail segments kept alive per rail.
pub const MAX_RAIL_SEGMENTS: usize = 30;
/// Cross-ties kept alive.
pub const MAX_TIES: usize = 50;

const RAIL_MIN_DISTANCE: f32 = 0.3;
const TIE_MIN_DISTANCE: f32 = 0.15;
/// Half-thickness of a rail profile.
const RAIL_HALF_HEIGHT: f32 = 0.01;
const RAIL_HALF_WIDTH: f32 = 0.01;
/// Lateral distance from the track centre to each rail.
const RAIL_GAUGE_OFFSET: f32 = 0.05;
const TIE_SIZE: Vec3 = Vec3::new(0.15, 0.02, 0.05);
const TIE_DROP: f32 = 0.01;

const RAIL_COLOR: u32 = 0x787879;
const TIE_COLOR: u32 = 0x503540;

/// Quad cross-section of a rail.
pub type RailProfile = [Vec3; 4];

/// Cross-section corners around `position`, ordered around the quad.
pub fn rail_profile(position: Vec3, rotation: Quat) -> RailProfile {
    let up = rotation * Vec3::new(0.0, RAIL_HALF_HEIGHT, 0.0);
    let right = rotation * Vec3::new(-RAIL_HALF_WIDTH, 0.0, 0.0);
    [
        position - up - right,
        position + up - right,
        position + up + right,
        position - up + right,
    ]
}

/// Flat-shaded strip joining two profiles: two triangles per adjacent corner pair.
pub fn stitch_profiles(previous: &RailProfile, current: &RailProfile) -> MeshData {
    let mut vertices = Vec::with_capacity((previous.len() - 1) * 6);
    let mut face = |a: Vec3, b: Vec3, c: Vec3| {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        vertices.push(Vertex::from_vec3(a, normal));
        vertices.push(Vertex::from_vec3(b, normal));
        vertices.push(Vertex::from_vec3(c, normal));
    };
    for i in 0..previous.len() - 1 {
        face(previous[i], current[i], previous[i + 1]);
        face(previous[i + 1], current[i], current[i + 1]);
    }
    MeshData::from_triangle_list(vertices)
}

/// Sliding window of scene nodes under one container.
#[derive(Debug)]
struct SegmentWindow {
    container: NodeId,
    nodes: VecDeque<NodeId>,
    capacity: usize,
}

impl SegmentWindow {
    fn new(scene: &mut impl SceneGraph, parent: NodeId, capacity: usize) -> Self {
        Self {
            container: scene.create_node(parent),
            nodes: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    fn push(&mut self, scene: &mut impl SceneGraph, node: NodeId) {
        self.nodes.push_back(node);
        while self.nodes.len() > self.capacity {
            if let Some(old) = self.nodes.pop_front() {
                scene.remove_node(old);
            }
        }
    }

    fn is_full(&self) -> bool {
        self.nodes.len() >= self.capacity
    }
}

/// One extruded rail.
#[derive(Debug)]
pub struct Rail {
    segments: SegmentWindow,
    last_position: Vec3,
    previous_profile: Option<RailProfile>,
    material: Material,
}

impl Rail {
    pub fn new(scene: &mut impl SceneGraph, parent: NodeId) -> Self {
        Self {
            segments: SegmentWindow::new(scene, parent, MAX_RAIL_SEGMENTS),
            last_position: Vec3::ZERO,
            previous_profile: None,
            material: Material::from_hex(RAIL_COLOR).with_metal(1.0, 0.0),
        }
    }

    /// Extend the rail to `position`. Returns whether the sample was accepted.
    pub fn add_point(&mut self, scene: &mut impl SceneGraph, position: Vec3, rotation: Quat) -> bool {
        if self.last_position.distance(position) < RAIL_MIN_DISTANCE {
            return false;
        }
        let profile = rail_profile(position, rotation);
        if let Some(previous) = &self.previous_profile {
            let node = scene.create_node(self.segments.container);
            scene.set_mesh(node, stitch_profiles(previous, &profile), self.material);
            self.segments.push(scene, node);
        }
        self.previous_profile = Some(profile);
        self.last_position = position;
        true
    }

    pub fn segment_count(&self) -> usize {
        self.segments.nodes.len()
    }

    /// Scene nodes of the live segments, oldest first.
    pub fn segments(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.segments.nodes.iter().copied()
    }

    pub fn is_loaded(&self) -> bool {
        self.segments.is_full()
    }
}

/// Cross-tie generator.
#[derive(Debug)]
pub struct Ties {
    boxes: SegmentWindow,
    last_position: Vec3,
    material: Material,
}

impl Ties {
    pub fn new(scene: &mut impl SceneGraph, parent: NodeId) -> Self {
        Self {
            boxes: SegmentWindow::new(scene, parent, MAX_TIES),
            last_position: Vec3::ZERO,
            material: Material::from_hex(TIE_COLOR),
        }
    }

    pub fn add_point(&mut self, scene: &mut impl SceneGraph, position: Vec3, rotation: Quat) -> bool {
        if self.last_position.distance(position) < TIE_MIN_DISTANCE {
            return false;
        }
        // Sit slightly below the rails.
        let lowered = position - rotation * Vec3::new(0.0, TIE_DROP, 0.0);
        let node = scene.create_node(self.boxes.container);
        scene.set_mesh(node, MeshData::cuboid(TIE_SIZE), self.material);
        scene.set_transform(node, Transform::from_position_rotation(lowered, rotation));
        self.boxes.push(scene, node);
        self.last_position = position;
        true
    }

    pub fn tie_count(&self) -> usize {
        self.boxes.nodes.len()
    }

    pub fn is_loaded(&self) -> bool {
        self.boxes.is_full()
    }
}

/// The whole track: left rail, right rail, ties.
#[derive(Debug)]
pub struct Rails {
    pub left: Rail,
    pub right: Rail,
    pub ties: Ties,
}

impl Rails {
    pub fn new(scene: &mut impl SceneGraph, parent: NodeId) -> Self {
        Self {
            left: Rail::new(scene, parent),
            right: Rail::new(scene, parent),
            ties: Ties::new(scene, parent),
        }
    }

    pub fn add_point(&mut self, scene: &mut impl SceneGraph, position: Vec3, rotation: Quat) {
        let offset = rotation * Vec3::new(RAIL_GAUGE_OFFSET, 0.0, 0.0);
        self.left.add_point(scene, position - offset, rotation);
        self.right.add_point(scene, position + offset, rotation);
        self.ties.add_point(scene, position, rotation);
    }

    /// True once every part has filled its window, i.e. the lookahead is primed.
    pub fn is_loaded(&self) -> bool {
        self.left.is_loaded() && self.right.is_loaded() && self.ties.is_loaded()
    }
}
