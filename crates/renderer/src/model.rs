//! glTF / GLB model import.
//!
//! Only geometry is read: positions, normals and indices of every primitive, merged
//! into one [`MeshData`]. Materials and textures are left to the renderer.

use std::path::{Path, PathBuf};

use crate::mesh::MeshData;
use crate::vertex::Vertex;

/// Errors from model import.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to import {}: {source}", .path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{} contains no triangle geometry", .0.display())]
    NoGeometry(PathBuf),
}

/// Load every mesh primitive of a glTF/GLB file into a single mesh.
pub fn load_model(path: impl AsRef<Path>) -> Result<MeshData, ModelError> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path).map_err(|source| ModelError::Import {
        path: path.to_path_buf(),
        source,
    })?;

    let mut merged = MeshData::default();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
            let vertices = positions
                .iter()
                .zip(normals.iter())
                .map(|(p, n)| Vertex::new(*p, *n))
                .collect::<Vec<_>>();
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            merged.append(&MeshData::new(vertices, indices));
        }
    }

    if merged.is_empty() {
        return Err(ModelError::NoGeometry(path.to_path_buf()));
    }
    log::info!(
        "Loaded model {:?}: {} vertices, {} triangles",
        path,
        merged.vertices.len(),
        merged.triangle_count()
    );
    Ok(merged)
}
