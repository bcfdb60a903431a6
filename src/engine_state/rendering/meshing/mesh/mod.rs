//! Mesh generation for voxel rendering.
//!
//! This module converts a chunk's voxel data into a GPU-ready vertex and index buffer
//! pair.
//!
//! # Architecture
//! - [`MeshData`]: The output buffers plus their running counts
//! - `face`: Emits the quad of one visible voxel face
//! - `sequential`: One pass over every interior column, x-major then z
//! - `parallel`: Rows of x meshed concurrently on the rayon pool, then compacted
//!
//! Both strategies visit, per interior column, every voxel from `y = 0` up to the
//! column's top (highest solid or liquid voxel) and emit a face on each side whose
//! neighbor is empty. The one voxel border of the chunk data is read for that test but
//! never meshed itself.
//!
//! # Usage
//! ```
//! use voxel_terrain::engine_state::rendering::meshing::mesh::generate_sequential;
//! use voxel_terrain::engine_state::voxels::block::{block_type::VoxelType, Voxel};
//! use voxel_terrain::engine_state::voxels::chunk::ChunkData;
//!
//! let mut data = ChunkData::new();
//! data.set_voxel(1, 0, 1, Voxel::new(VoxelType::STONE));
//! data.recalculate_heightmap(1, 1);
//!
//! let mesh = generate_sequential(&data);
//! assert_eq!(mesh.triangle_count(), 12);
//! ```

use std::ops::RangeInclusive;

use crate::engine_state::rendering::meshing::GeometrySize;
use crate::engine_state::rendering::vertex::MeshVertex;
use crate::engine_state::voxels::chunk::{ChunkData, CHUNK_WIDTH};

mod face;
mod parallel;
mod sequential;

pub use parallel::generate_parallel;
pub use sequential::generate_sequential;

/// The render mesh of one chunk.
///
/// Indices are relative to this mesh's own vertex buffer. Counts are derived from the
/// buffers, so they can never disagree with them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    max_height: u32,
}

impl MeshData {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty mesh with room for the typical output of `data`.
    ///
    /// The estimate assumes half of the six faces of every renderable voxel are visible.
    /// It only sizes the first allocation; the buffers grow past it when needed.
    pub fn with_capacity_for(data: &ChunkData) -> Self {
        let renderable = data.renderable_voxel_count();
        MeshData {
            vertices: Vec::with_capacity(renderable * 6 * 4 / 2),
            indices: Vec::with_capacity(renderable * 6 * 6 / 2),
            max_height: 0,
        }
    }

    /// Builds a mesh from existing buffers.
    pub fn with_geometry(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let max_height = vertices.iter().map(|v| v.height).max().unwrap_or(0);
        MeshData {
            vertices,
            indices,
            max_height,
        }
    }

    /// The vertex buffer.
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// The index buffer.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Highest vertex y in the mesh, 0 when empty.
    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn size(&self) -> GeometrySize {
        GeometrySize {
            vertices: self.vertices.len(),
            indices: self.indices.len(),
        }
    }

    /// Appends another mesh, rebasing its indices onto this mesh's vertex buffer.
    pub fn append(&mut self, other: MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|index| index + base));
        self.max_height = self.max_height.max(other.max_height);
    }

    /// The triangles as vertex triples, in index-buffer order.
    pub fn triangles(&self) -> impl Iterator<Item = [MeshVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|triangle| {
            [
                self.vertices[triangle[0] as usize],
                self.vertices[triangle[1] as usize],
                self.vertices[triangle[2] as usize],
            ]
        })
    }
}

/// Meshes the interior rows `rows` (wrapped x coordinates) of `data` into `mesh`.
fn mesh_rows(data: &ChunkData, rows: RangeInclusive<usize>, mesh: &mut MeshData) {
    for x in rows {
        for z in 1..=CHUNK_WIDTH {
            let top = data.get_heightmap(x, z).column_top() as usize;
            let column = data.column(x, z);
            for (y, voxel) in column.iter().enumerate().take(top + 1) {
                if voxel.is_empty() {
                    continue;
                }
                face::emit_visible_faces(data, x, y, z, mesh);
            }
        }
    }
}
