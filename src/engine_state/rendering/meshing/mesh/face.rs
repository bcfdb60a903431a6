use crate::engine_state::rendering::vertex::MeshVertex;
use crate::engine_state::voxels::block::block_side::{BlockSide, FACE_INDICES};
use crate::engine_state::voxels::chunk::ChunkData;

use super::MeshData;

/// Emits the quad of every face of the voxel at wrapped `(x, y, z)` whose neighbor is
/// empty or above/below the chunk.
///
/// Vertices are written in chunk-local space, which drops the border offset.
pub(super) fn emit_visible_faces(data: &ChunkData, x: usize, y: usize, z: usize, mesh: &mut MeshData) {
    for side in BlockSide::all() {
        let offset = side.offset();
        let neighbor_x = (x as i32 + offset.x) as usize;
        let neighbor_z = (z as i32 + offset.z) as usize;
        if data.is_empty_at(neighbor_x, y as i32 + offset.y, neighbor_z) {
            emit_face(mesh, x - 1, y, z - 1, side);
        }
    }
}

/// Appends the four vertices and six indices of one face at chunk-local `(x, y, z)`.
fn emit_face(mesh: &mut MeshData, x: usize, y: usize, z: usize, side: BlockSide) {
    let base = mesh.vertices.len() as u32;
    for (uv, corner) in side.corners().iter().enumerate() {
        let vertex = MeshVertex::new(
            x as u32 + corner[0] as u32,
            y as u32 + corner[1] as u32,
            z as u32 + corner[2] as u32,
            side,
            uv as u32,
        );
        mesh.max_height = mesh.max_height.max(vertex.height);
        mesh.vertices.push(vertex);
    }
    mesh.indices.extend(FACE_INDICES.iter().map(|index| base + index));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{block_type::VoxelType, Voxel};

    #[test]
    fn a_buried_voxel_emits_nothing() {
        let mut data = ChunkData::new();
        for x in 1..=3 {
            for y in 0..=2 {
                for z in 1..=3 {
                    data.set_voxel(x, y, z, Voxel::new(VoxelType::STONE));
                }
            }
        }
        let mut mesh = MeshData::new();
        emit_visible_faces(&data, 2, 1, 2, &mut mesh);
        assert!(mesh.is_empty());

        // The bottom layer still shows its underside, y = -1 counts as empty.
        emit_visible_faces(&data, 2, 0, 2, &mut mesh);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices()[0].side(), Some(BlockSide::BOTTOM));
    }

    #[test]
    fn face_vertices_are_chunk_local() {
        let mut mesh = MeshData::new();
        emit_face(&mut mesh, 15, 127, 15, BlockSide::TOP);
        let corners: Vec<_> = mesh.vertices().iter().map(|v| (v.x(), v.y(), v.z())).collect();
        assert_eq!(corners, vec![(15, 128, 15), (15, 128, 16), (16, 128, 16), (16, 128, 15)]);
        assert_eq!(mesh.max_height(), 128);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
    }
}
