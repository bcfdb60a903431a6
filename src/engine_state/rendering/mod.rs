//! Geometry side of the terrain core.
//!
//! This module contains everything that turns voxel data into GPU- and physics-ready
//! buffers: the packed vertex format and the mesh and collider generators. Uploading the
//! buffers and drawing them belongs to the host renderer.

pub mod meshing;
pub mod vertex;

// Re-export commonly used types
pub use meshing::{ColliderData, GeometrySize, MeshData, MeshStrategy};
pub use vertex::MeshVertex;
