use rayon::prelude::*;

use crate::engine_state::voxels::chunk::{ChunkData, CHUNK_WIDTH};

use super::{mesh_rows, MeshData};

/// Meshes a chunk with one rayon task per row of x.
///
/// Every row writes into a private buffer; the buffers are then concatenated in row
/// order with their indices rebased. The result equals [`super::generate_sequential`]'s.
pub fn generate_parallel(data: &ChunkData) -> MeshData {
    let rows: Vec<MeshData> = (1..=CHUNK_WIDTH)
        .into_par_iter()
        .map(|x| {
            let mut row = MeshData::new();
            mesh_rows(data, x..=x, &mut row);
            row
        })
        .collect();

    let mut mesh = MeshData::with_capacity_for(data);
    for row in rows {
        mesh.append(row);
    }
    mesh
}
