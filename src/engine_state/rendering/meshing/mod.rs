//! Geometry generation for chunks.
//!
//! This module turns chunk data into the two geometry products the rest of the engine
//! consumes:
//! - the render mesh ([`MeshData`]), built by one of the [`MeshStrategy`] variants
//! - the collision mesh ([`ColliderData`]), built from heightmaps only
//!
//! Both run on worker threads against a shared read-only `ChunkData`.

use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::chunk::ChunkData;

pub mod collider;
pub mod mesh;

pub use collider::{generate_collider, ColliderData};
pub use mesh::MeshData;

/// Vertex and index counts of a geometry buffer pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GeometrySize {
    pub vertices: usize,
    pub indices: usize,
}

impl std::ops::Add for GeometrySize {
    type Output = GeometrySize;

    fn add(self, other: GeometrySize) -> GeometrySize {
        GeometrySize {
            vertices: self.vertices + other.vertices,
            indices: self.indices + other.indices,
        }
    }
}

impl GeometrySize {
    /// Replaces `old` by `new` in a running total.
    pub fn swap(self, old: GeometrySize, new: GeometrySize) -> GeometrySize {
        GeometrySize {
            vertices: self.vertices.saturating_sub(old.vertices) + new.vertices,
            indices: self.indices.saturating_sub(old.indices) + new.indices,
        }
    }
}

/// How the render mesh of a chunk is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshStrategy {
    /// One pass on the stage's worker thread.
    #[default]
    Sequential,
    /// Rows meshed concurrently on the rayon pool, then compacted.
    Parallel,
}

/// Builds the render mesh of `data` with `strategy`.
pub fn generate_mesh(data: &ChunkData, strategy: MeshStrategy) -> MeshData {
    match strategy {
        MeshStrategy::Sequential => mesh::generate_sequential(data),
        MeshStrategy::Parallel => mesh::generate_parallel(data),
    }
}
