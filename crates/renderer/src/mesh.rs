//! Mesh data structures and primitive generation.
//!
//! [`MeshData`] is the CPU-side geometry handed to the scene; [`Mesh`] is its GPU
//! upload. Dropping a [`Mesh`] releases its buffers.

use crate::vertex::Vertex;
use glam::Vec3;
use wgpu::util::DeviceExt;

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Non-indexed triangle soup: every three vertices form one triangle.
    pub fn from_triangle_list(vertices: Vec<Vertex>) -> Self {
        let indices = (0..vertices.len() as u32).collect();
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Scale all positions uniformly.
    pub fn scaled(mut self, factor: f32) -> Self {
        for v in &mut self.vertices {
            v.position = (v.position() * factor).to_array();
        }
        self
    }

    /// Box centred at origin with the given full extents.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let (x, y, z) = (h.x, h.y, h.z);
        let vertices = vec![
            // Front face
            Vertex::new([-x, -y, z], [0.0, 0.0, 1.0]),
            Vertex::new([x, -y, z], [0.0, 0.0, 1.0]),
            Vertex::new([x, y, z], [0.0, 0.0, 1.0]),
            Vertex::new([-x, y, z], [0.0, 0.0, 1.0]),
            // Back face
            Vertex::new([x, -y, -z], [0.0, 0.0, -1.0]),
            Vertex::new([-x, -y, -z], [0.0, 0.0, -1.0]),
            Vertex::new([-x, y, -z], [0.0, 0.0, -1.0]),
            Vertex::new([x, y, -z], [0.0, 0.0, -1.0]),
            // Top face
            Vertex::new([-x, y, z], [0.0, 1.0, 0.0]),
            Vertex::new([x, y, z], [0.0, 1.0, 0.0]),
            Vertex::new([x, y, -z], [0.0, 1.0, 0.0]),
            Vertex::new([-x, y, -z], [0.0, 1.0, 0.0]),
            // Bottom face
            Vertex::new([-x, -y, -z], [0.0, -1.0, 0.0]),
            Vertex::new([x, -y, -z], [0.0, -1.0, 0.0]),
            Vertex::new([x, -y, z], [0.0, -1.0, 0.0]),
            Vertex::new([-x, -y, z], [0.0, -1.0, 0.0]),
            // Right face
            Vertex::new([x, -y, z], [1.0, 0.0, 0.0]),
            Vertex::new([x, -y, -z], [1.0, 0.0, 0.0]),
            Vertex::new([x, y, -z], [1.0, 0.0, 0.0]),
            Vertex::new([x, y, z], [1.0, 0.0, 0.0]),
            // Left face
            Vertex::new([-x, -y, -z], [-1.0, 0.0, 0.0]),
            Vertex::new([-x, -y, z], [-1.0, 0.0, 0.0]),
            Vertex::new([-x, y, z], [-1.0, 0.0, 0.0]),
            Vertex::new([-x, y, -z], [-1.0, 0.0, 0.0]),
        ];

        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 2, 3, 0,       // Front
            4, 5, 6, 6, 7, 4,       // Back
            8, 9, 10, 10, 11, 8,    // Top
            12, 13, 14, 14, 15, 12, // Bottom
            16, 17, 18, 18, 19, 16, // Right
            20, 21, 22, 22, 23, 20, // Left
        ];

        Self { vertices, indices }
    }

    /// Billboard quad (XY plane, facing +Z). Use with a camera-facing rotation
    /// to create particles that always face the viewer.
    pub fn billboard_quad(size: f32) -> Self {
        let half = size / 2.0;
        let vertices = vec![
            Vertex::new([-half, -half, 0.0], [0.0, 0.0, 1.0]),
            Vertex::new([half, -half, 0.0], [0.0, 0.0, 1.0]),
            Vertex::new([half, half, 0.0], [0.0, 0.0, 1.0]),
            Vertex::new([-half, half, 0.0], [0.0, 0.0, 1.0]),
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }
}

/// A GPU mesh with vertex and index buffers.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Create a mesh from vertex and index data.
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    /// Upload CPU mesh data.
    pub fn from_data(device: &wgpu::Device, data: &MeshData) -> Self {
        Self::new(device, &data.vertices, &data.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_has_six_faces() {
        let cube = MeshData::cuboid(Vec3::new(0.15, 0.02, 0.05));
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let max_x = cube.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert!((max_x - 0.075).abs() < 1e-6);
    }

    #[test]
    fn append_offsets_indices() {
        let mut a = MeshData::billboard_quad(1.0);
        let b = MeshData::billboard_quad(2.0);
        a.append(&b);
        assert_eq!(a.vertices.len(), 8);
        assert_eq!(&a.indices[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn triangle_list_indices_are_sequential() {
        let v = Vertex::new([0.0; 3], [0.0, 1.0, 0.0]);
        let mesh = MeshData::from_triangle_list(vec![v; 6]);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.triangle_count(), 2);
    }
}
