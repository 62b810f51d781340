//! Scene attachment.
//!
//! Gameplay code never owns GPU objects directly. It creates nodes under a parent,
//! writes transforms and meshes into them, and removes them when done. [`SceneTree`]
//! is the in-memory hierarchy; [`GpuMeshCache`] mirrors its meshes into wgpu buffers.

use std::collections::HashMap;

use engine_core::{Transform, TransformRaw};

use crate::mesh::{Mesh, MeshData};
use crate::vertex::InstanceData;

/// Handle to a node in a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Surface appearance of a mesh node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub transparent: bool,
}

impl Material {
    /// Opaque material from a packed `0xRRGGBB` color.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self {
            color: [channel(16), channel(8), channel(0), 1.0],
            metalness: 0.0,
            roughness: 1.0,
            transparent: false,
        }
    }

    pub fn with_metal(mut self, metalness: f32, roughness: f32) -> Self {
        self.metalness = metalness;
        self.roughness = roughness;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::from_hex(0xffffff)
    }
}

/// Write interface to whatever renders the world.
pub trait SceneGraph {
    /// Top-level node everything else hangs from.
    fn root(&self) -> NodeId;
    /// Create an empty node under `parent`.
    fn create_node(&mut self, parent: NodeId) -> NodeId;
    /// Set the node's transform relative to its parent.
    fn set_transform(&mut self, node: NodeId, transform: Transform);
    /// Attach (or replace) geometry on the node.
    fn set_mesh(&mut self, node: NodeId, mesh: MeshData, material: Material);
    fn set_opacity(&mut self, node: NodeId, opacity: f32);
    /// Move `node` under a different parent, keeping its local transform.
    fn reparent(&mut self, node: NodeId, parent: NodeId);
    /// Remove the node and all of its descendants, releasing their geometry.
    fn remove_node(&mut self, node: NodeId);
}

#[derive(Debug, Clone)]
struct SceneNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: Transform,
    mesh: Option<MeshData>,
    material: Material,
    opacity: f32,
    /// Bumped whenever the mesh changes so caches know to re-upload.
    revision: u64,
}

impl SceneNode {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            transform: Transform::default(),
            mesh: None,
            material: Material::default(),
            opacity: 1.0,
            revision: 0,
        }
    }
}

/// In-memory scene hierarchy.
#[derive(Debug, Clone)]
pub struct SceneTree {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u32,
    next_revision: u64,
    /// Nodes removed since the last [`SceneTree::take_removed`].
    removed: Vec<NodeId>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, SceneNode::new(None));
        Self {
            nodes,
            root,
            next_id: 1,
            next_revision: 1,
            removed: Vec::new(),
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(&node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn local_transform(&self, node: NodeId) -> Option<Transform> {
        self.nodes.get(&node).map(|n| n.transform)
    }

    /// Transform in world space: the chain of parent transforms composed down to `node`.
    pub fn world_transform(&self, node: NodeId) -> Option<Transform> {
        let n = self.nodes.get(&node)?;
        match n.parent {
            Some(parent) => Some(self.world_transform(parent)?.mul_transform(&n.transform)),
            None => Some(n.transform),
        }
    }

    pub fn mesh(&self, node: NodeId) -> Option<&MeshData> {
        self.nodes.get(&node).and_then(|n| n.mesh.as_ref())
    }

    pub fn material(&self, node: NodeId) -> Option<Material> {
        self.nodes.get(&node).map(|n| n.material)
    }

    pub fn opacity(&self, node: NodeId) -> Option<f32> {
        self.nodes.get(&node).map(|n| n.opacity)
    }

    /// Number of nodes currently carrying geometry.
    pub fn mesh_count(&self) -> usize {
        self.nodes.values().filter(|n| n.mesh.is_some()).count()
    }

    /// Drain the list of nodes removed since the last call.
    pub fn take_removed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.removed)
    }

    fn meshes_with_revision(&self) -> impl Iterator<Item = (NodeId, &MeshData, u64)> {
        self.nodes
            .iter()
            .filter_map(|(id, n)| n.mesh.as_ref().map(|m| (*id, m, n.revision)))
    }

    fn detach_from_parent(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != node);
            }
        }
    }
}

impl SceneGraph for SceneTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: NodeId) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let parent = if self.nodes.contains_key(&parent) {
            parent
        } else {
            log::warn!("create_node: unknown parent {:?}, attaching to root", parent);
            self.root
        };
        self.nodes.insert(id, SceneNode::new(Some(parent)));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.transform = transform;
        }
    }

    fn set_mesh(&mut self, node: NodeId, mesh: MeshData, material: Material) {
        let revision = self.next_revision;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.mesh = Some(mesh);
            n.material = material;
            n.revision = revision;
            self.next_revision += 1;
        }
    }

    fn set_opacity(&mut self, node: NodeId, opacity: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn reparent(&mut self, node: NodeId, parent: NodeId) {
        if node == self.root || !self.contains(node) || !self.contains(parent) {
            return;
        }
        self.detach_from_parent(node);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(node);
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        if node == self.root || !self.contains(node) {
            return;
        }
        self.detach_from_parent(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.remove(&id) {
                stack.extend(n.children);
                self.removed.push(id);
            }
        }
    }
}

/// Uploaded copies of the meshes in a [`SceneTree`], keyed by node and mesh revision.
///
/// `M` is whatever the upload produces; [`GpuMeshCache`] stores wgpu buffers.
pub struct MeshCache<M> {
    meshes: HashMap<NodeId, (u64, M)>,
}

/// Mesh cache holding wgpu vertex and index buffers.
pub type GpuMeshCache = MeshCache<Mesh>;

impl<M> Default for MeshCache<M> {
    fn default() -> Self {
        Self {
            meshes: HashMap::new(),
        }
    }
}

impl<M> MeshCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<&M> {
        self.meshes.get(&node).map(|(_, mesh)| mesh)
    }

    /// Upload new or changed meshes and drop entries of removed nodes. Returns the
    /// number of uploads.
    pub fn sync_with(&mut self, tree: &mut SceneTree, mut upload: impl FnMut(&MeshData) -> M) -> usize {
        for id in tree.take_removed() {
            self.meshes.remove(&id);
        }
        let mut uploads = 0;
        for (id, data, revision) in tree.meshes_with_revision() {
            let stale = self.meshes.get(&id).map_or(true, |(r, _)| *r != revision);
            if stale && !data.is_empty() {
                self.meshes.insert(id, (revision, upload(data)));
                uploads += 1;
            }
        }
        uploads
    }

    /// Cached mesh and its per-instance data for every visible node.
    pub fn draw_list<'a>(&'a self, tree: &SceneTree) -> Vec<(&'a M, InstanceData)> {
        self.meshes
            .iter()
            .filter_map(|(id, (_, mesh))| Some((mesh, instance_data(tree, *id)?)))
            .collect()
    }
}

impl MeshCache<Mesh> {
    pub fn sync(&mut self, device: &wgpu::Device, tree: &mut SceneTree) -> usize {
        self.sync_with(tree, |data| Mesh::from_data(device, data))
    }
}

/// World matrix and tint of a node, or `None` if it is gone or fully transparent.
fn instance_data(tree: &SceneTree, node: NodeId) -> Option<InstanceData> {
    let opacity = tree.opacity(node)?;
    if opacity <= 0.0 {
        return None;
    }
    let raw = TransformRaw::from(tree.world_transform(node)?);
    let mut color = tree.material(node)?.color;
    color[3] *= opacity;
    Some(InstanceData::new(raw.model, color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn world_transform_composes_parents() {
        let mut tree = SceneTree::new();
        let pivot = tree.create_node(tree.root());
        let tip = tree.create_node(pivot);
        tree.set_transform(
            pivot,
            Transform::from_position_rotation(Vec3::ZERO, Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
        );
        tree.set_transform(tip, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        let world = tree.world_transform(tip).unwrap();
        assert!((world.position - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn remove_node_drops_descendants_and_reports_them() {
        let mut tree = SceneTree::new();
        let a = tree.create_node(tree.root());
        let b = tree.create_node(a);
        tree.set_mesh(b, MeshData::billboard_quad(1.0), Material::default());
        assert_eq!(tree.mesh_count(), 1);
        tree.remove_node(a);
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.mesh_count(), 0);
        let mut removed = tree.take_removed();
        removed.sort();
        assert_eq!(removed, vec![a, b]);
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn reparent_moves_node() {
        let mut tree = SceneTree::new();
        let a = tree.create_node(tree.root());
        let b = tree.create_node(tree.root());
        let c = tree.create_node(a);
        tree.reparent(c, b);
        assert_eq!(tree.parent(c), Some(b));
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[c]);
    }

    #[test]
    fn material_from_hex_unpacks_channels() {
        let m = Material::from_hex(0xff8000);
        assert_eq!(m.color[0], 1.0);
        assert!((m.color[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(m.color[2], 0.0);
    }

    /// Cache keyed on vertex counts so uploads can be observed without a device.
    fn counting_cache(tree: &mut SceneTree, cache: &mut MeshCache<usize>) -> usize {
        cache.sync_with(tree, |data| data.vertices.len())
    }

    #[test]
    fn cache_uploads_only_new_or_changed_meshes() {
        let mut tree = SceneTree::new();
        let a = tree.create_node(tree.root());
        let b = tree.create_node(tree.root());
        tree.set_mesh(a, MeshData::billboard_quad(1.0), Material::default());
        tree.set_mesh(b, MeshData::cuboid(Vec3::ONE), Material::default());
        let mut cache = MeshCache::new();
        assert_eq!(counting_cache(&mut tree, &mut cache), 2);
        assert_eq!(counting_cache(&mut tree, &mut cache), 0);

        tree.set_mesh(a, MeshData::cuboid(Vec3::ONE), Material::default());
        assert_eq!(counting_cache(&mut tree, &mut cache), 1);
        assert_eq!(cache.get(a), cache.get(b));
    }

    #[test]
    fn cache_skips_empty_meshes_and_drops_removed_nodes() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node(tree.root());
        let child = tree.create_node(parent);
        let empty = tree.create_node(tree.root());
        tree.set_mesh(child, MeshData::billboard_quad(1.0), Material::default());
        tree.set_mesh(empty, MeshData::default(), Material::default());
        let mut cache = MeshCache::new();
        counting_cache(&mut tree, &mut cache);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(empty).is_none());

        tree.remove_node(parent);
        counting_cache(&mut tree, &mut cache);
        assert!(cache.is_empty());
        assert!(cache.draw_list(&tree).is_empty());
    }

    #[test]
    fn draw_list_hides_transparent_nodes_and_scales_alpha() {
        let mut tree = SceneTree::new();
        let pivot = tree.create_node(tree.root());
        let puff = tree.create_node(pivot);
        let faded = tree.create_node(tree.root());
        tree.set_transform(pivot, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        tree.set_mesh(puff, MeshData::billboard_quad(1.0), Material::from_hex(0xffffff).transparent());
        tree.set_mesh(faded, MeshData::billboard_quad(1.0), Material::default());
        tree.set_opacity(puff, 0.25);
        tree.set_opacity(faded, 0.0);
        let mut cache = MeshCache::new();
        counting_cache(&mut tree, &mut cache);
        assert_eq!(cache.len(), 2);

        let list = cache.draw_list(&tree);
        assert_eq!(list.len(), 1);
        let (_, instance) = list[0];
        assert_eq!(instance.color[3], 0.25);
        assert_eq!(instance.model[3][..3], [1.0, 2.0, 3.0]);
    }
}
