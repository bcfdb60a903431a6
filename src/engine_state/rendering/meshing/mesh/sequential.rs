use crate::engine_state::voxels::chunk::{ChunkData, CHUNK_WIDTH};

use super::{mesh_rows, MeshData};

/// Meshes a whole chunk in a single pass on the calling thread.
pub fn generate_sequential(data: &ChunkData) -> MeshData {
    let mut mesh = MeshData::with_capacity_for(data);
    mesh_rows(data, 1..=CHUNK_WIDTH, &mut mesh);
    mesh
}
