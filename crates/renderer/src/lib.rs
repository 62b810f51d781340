//! Rendering-side data for the orbital train: meshes, scene attachment, camera, models.

pub mod camera;
pub mod mesh;
pub mod model;
pub mod scene;
pub mod vertex;

pub use camera::*;
pub use mesh::*;
pub use model::*;
pub use scene::*;
pub use vertex::*;
