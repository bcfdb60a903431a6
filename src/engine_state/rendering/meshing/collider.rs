//! Collision geometry generation.
//!
//! Colliders are built from heightmaps alone. Every interior column contributes a top
//! quad one voxel above its highest solid voxel, and a vertical wall towards each
//! horizontal neighbor whose surface is lower. Walls at the chunk edge read the
//! neighbor from the border ring, so adjacent chunks meet without gaps while flat
//! ground produces no walls at all.
//!
//! Liquids are not collidable and overhangs are not represented.

use std::collections::HashMap;

use cgmath::Point3;

use crate::engine_state::rendering::meshing::GeometrySize;
use crate::engine_state::rendering::vertex::{pack_position, unpack_x, unpack_y, unpack_z};
use crate::engine_state::voxels::block::block_side::{BlockSide, FACE_INDICES};
use crate::engine_state::voxels::chunk::{ChunkData, CHUNK_WIDTH};

/// The collision mesh of one chunk.
///
/// Vertices use the packed position layout of the render mesh with the face and UV bits
/// left at zero. Each distinct corner appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColliderData {
    vertices: Vec<u32>,
    indices: Vec<u32>,
}

impl ColliderData {
    /// The packed vertex buffer.
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    /// The index buffer.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn size(&self) -> GeometrySize {
        GeometrySize {
            vertices: self.vertices.len(),
            indices: self.indices.len(),
        }
    }

    /// Decodes the vertex buffer into chunk-local positions, for physics engines that
    /// take plain coordinates.
    pub fn positions(&self) -> Vec<Point3<u32>> {
        self.vertices
            .iter()
            .map(|&word| Point3::new(unpack_x(word), unpack_y(word), unpack_z(word)))
            .collect()
    }
}

/// Deduplicating writer for collider quads.
struct ColliderBuilder {
    data: ColliderData,
    lookup: HashMap<(i32, i32, i32), u32>,
}

impl ColliderBuilder {
    fn new() -> Self {
        // Worst case: a top and four walls per column.
        let quads = CHUNK_WIDTH * CHUNK_WIDTH * 5;
        ColliderBuilder {
            data: ColliderData {
                vertices: Vec::with_capacity(quads * 4),
                indices: Vec::with_capacity(quads * 6),
            },
            lookup: HashMap::with_capacity(quads * 4),
        }
    }

    fn vertex(&mut self, corner: (i32, i32, i32)) -> u32 {
        let vertices = &mut self.data.vertices;
        *self.lookup.entry(corner).or_insert_with(|| {
            vertices.push(pack_position(
                corner.0 as u32,
                corner.1 as u32,
                corner.2 as u32,
                0,
                0,
            ));
            (vertices.len() - 1) as u32
        })
    }

    /// Emits the quad of `side` for the voxel-sized cell at `(x, z)`, spanning `bottom`
    /// to `top` vertically. Top quads pass the same value for both.
    fn quad(&mut self, x: i32, z: i32, bottom: i32, top: i32, side: BlockSide) {
        let mut corners = [0u32; 4];
        for (slot, corner) in corners.iter_mut().zip(side.corners()) {
            let y = if corner[1] == 0 { bottom } else { top };
            *slot = self.vertex((x + corner[0], y, z + corner[2]));
        }
        self.data
            .indices
            .extend(FACE_INDICES.iter().map(|&i| corners[i as usize]));
    }
}

/// Builds the collision mesh of a chunk from its heightmaps.
pub fn generate_collider(data: &ChunkData) -> ColliderData {
    let mut builder = ColliderBuilder::new();

    for x in 1..=CHUNK_WIDTH {
        for z in 1..=CHUNK_WIDTH {
            let surface = data.get_heightmap(x, z).get_solid() as i32 + 1;
            let (local_x, local_z) = (x as i32 - 1, z as i32 - 1);

            builder.quad(local_x, local_z, surface - 1, surface, BlockSide::TOP);

            for side in BlockSide::horizontal() {
                let offset = side.offset();
                let neighbor = data.get_heightmap(
                    (x as i32 + offset.x) as usize,
                    (z as i32 + offset.z) as usize,
                );
                let neighbor_surface = neighbor.get_solid() as i32 + 1;
                if neighbor_surface < surface {
                    builder.quad(local_x, local_z, neighbor_surface, surface, side);
                }
            }
        }
    }

    builder.data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::CHUNK_WIDTH_WRAPPED;
    use crate::engine_state::voxels::height_map::HeightMap;

    fn flat(height: u32) -> ChunkData {
        let mut data = ChunkData::new();
        for x in 0..CHUNK_WIDTH_WRAPPED {
            for z in 0..CHUNK_WIDTH_WRAPPED {
                let mut heightmap = HeightMap::default();
                heightmap.set_solid(height);
                data.set_heightmap(x, z, heightmap);
            }
        }
        data
    }

    #[test]
    fn flat_terrain_has_no_walls() {
        let collider = generate_collider(&flat(10));
        assert_eq!(collider.triangle_count(), CHUNK_WIDTH * CHUNK_WIDTH * 2);
        assert_eq!(collider.vertices().len(), (CHUNK_WIDTH + 1) * (CHUNK_WIDTH + 1));
        assert!(collider.positions().iter().all(|p| p.y == 11));
    }

    #[test]
    fn a_raised_column_is_closed_on_all_four_sides() {
        let mut data = flat(10);
        let mut pillar = HeightMap::default();
        pillar.set_solid(14);
        data.set_heightmap(8, 8, pillar);

        let collider = generate_collider(&data);
        assert_eq!(
            collider.triangle_count(),
            (CHUNK_WIDTH * CHUNK_WIDTH + 4) * 2
        );

        let positions = collider.positions();
        let walls: Vec<_> = collider
            .indices()
            .chunks_exact(3)
            .filter(|t| {
                let ys: Vec<_> = t.iter().map(|&i| positions[i as usize].y).collect();
                ys.iter().any(|&y| y != ys[0])
            })
            .collect();
        assert_eq!(walls.len(), 8);
        // Walls span from the ground surface up to the pillar surface.
        for wall in walls {
            for &index in wall {
                let y = positions[index as usize].y;
                assert!(y == 11 || y == 15);
            }
        }
    }

    #[test]
    fn edges_read_the_border_ring() {
        let mut data = flat(10);
        for z in 0..CHUNK_WIDTH_WRAPPED {
            data.set_heightmap(0, z, HeightMap::default());
        }
        let collider = generate_collider(&data);
        // One wall per edge column facing the lower border.
        assert_eq!(
            collider.triangle_count(),
            (CHUNK_WIDTH * CHUNK_WIDTH + CHUNK_WIDTH) * 2
        );
    }

    #[test]
    fn corners_are_shared_between_quads() {
        let collider = generate_collider(&flat(3));
        let mut seen = std::collections::HashSet::new();
        assert!(collider.vertices().iter().all(|v| seen.insert(*v)));
    }
}
