//! # Chunk Data Module
//!
//! The raw voxel and heightmap buffers of one chunk.
//!
//! ## Layout
//!
//! Both buffers cover the chunk plus a one voxel border on each horizontal side, so
//! neighbor lookups during meshing and collider generation never leave the buffer:
//! - `voxels`: `CHUNK_WIDTH_WRAPPED² × CHUNK_HEIGHT` entries, column-major. A column's
//!   voxels are contiguous in Y: `index = (x * CHUNK_WIDTH_WRAPPED + z) * CHUNK_HEIGHT + y`
//! - `heightmaps`: `CHUNK_WIDTH_WRAPPED²` entries, `index = x * CHUNK_WIDTH_WRAPPED + z`
//!
//! All coordinates taken by this module are wrapped coordinates: `0` and
//! `CHUNK_WIDTH_WRAPPED - 1` are the border, `1..=CHUNK_WIDTH` the chunk itself.

use crate::engine_state::voxels::{block::Voxel, height_map::HeightMap};

use super::{CHUNK_COLUMNS_WRAPPED, CHUNK_HEIGHT, CHUNK_VOXELS_WRAPPED, CHUNK_WIDTH, CHUNK_WIDTH_WRAPPED};

/// Owns the voxel and heightmap buffers of one chunk.
///
/// The buffers are produced by the terrain generator on a worker thread, moved into the
/// chunk when the generation job completes, and dropped when the chunk is cleared.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkData {
    voxels: Vec<Voxel>,
    heightmaps: Vec<HeightMap>,
}

impl Default for ChunkData {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkData {
    /// Creates buffers filled with air and zeroed heightmaps.
    pub fn new() -> Self {
        ChunkData {
            voxels: vec![Voxel::AIR; CHUNK_VOXELS_WRAPPED],
            heightmaps: vec![HeightMap::default(); CHUNK_COLUMNS_WRAPPED],
        }
    }

    /// Buffer index of a wrapped voxel coordinate.
    #[inline]
    pub const fn voxel_index(x: usize, y: usize, z: usize) -> usize {
        (x * CHUNK_WIDTH_WRAPPED + z) * CHUNK_HEIGHT + y
    }

    /// Buffer index of a wrapped column coordinate.
    #[inline]
    pub const fn heightmap_index(x: usize, z: usize) -> usize {
        x * CHUNK_WIDTH_WRAPPED + z
    }

    /// Reads a voxel.
    ///
    /// # Panics
    /// Panics if the coordinate lies outside the wrapped chunk.
    #[inline]
    pub fn get_voxel(&self, x: usize, y: usize, z: usize) -> Voxel {
        self.voxels[Self::voxel_index(x, y, z)]
    }

    /// Writes a voxel without touching the heightmap. Call
    /// [`recalculate_heightmap`](Self::recalculate_heightmap) afterwards when the
    /// column's extents may have changed.
    #[inline]
    pub fn set_voxel(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) {
        self.voxels[Self::voxel_index(x, y, z)] = voxel;
    }

    /// Emptiness test that treats anything above or below the chunk as empty.
    ///
    /// Horizontal coordinates must stay within the wrapped chunk.
    #[inline]
    pub fn is_empty_at(&self, x: usize, y: i32, z: usize) -> bool {
        if y < 0 || y >= CHUNK_HEIGHT as i32 {
            return true;
        }
        self.get_voxel(x, y as usize, z).is_empty()
    }

    /// Reads a column's heightmap.
    #[inline]
    pub fn get_heightmap(&self, x: usize, z: usize) -> HeightMap {
        self.heightmaps[Self::heightmap_index(x, z)]
    }

    /// Writes a column's heightmap.
    #[inline]
    pub fn set_heightmap(&mut self, x: usize, z: usize, heightmap: HeightMap) {
        self.heightmaps[Self::heightmap_index(x, z)] = heightmap;
    }

    /// The voxels of one column, bottom to top.
    pub fn column(&self, x: usize, z: usize) -> &[Voxel] {
        let start = Self::voxel_index(x, 0, z);
        &self.voxels[start..start + CHUNK_HEIGHT]
    }

    /// The whole voxel buffer.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// The whole heightmap buffer.
    pub fn heightmaps(&self) -> &[HeightMap] {
        &self.heightmaps
    }

    /// Rebuilds a column's heightmap from its voxels.
    ///
    /// Solid height is the highest solid voxel (0 when there is none). Liquid bounds
    /// cover the lowest and highest liquid voxels, or stay 0 for a dry column.
    pub fn recalculate_heightmap(&mut self, x: usize, z: usize) {
        let mut heightmap = HeightMap::default();
        let mut liquid_bottom = None;
        let mut liquid_top = None;

        for (y, voxel) in self.column(x, z).iter().enumerate() {
            if voxel.is_solid() {
                heightmap.set_solid(y as u32);
            } else if voxel.is_liquid() {
                liquid_bottom.get_or_insert(y as u32);
                liquid_top = Some(y as u32);
            }
        }

        if let (Some(bottom), Some(top)) = (liquid_bottom, liquid_top) {
            heightmap.set_liquid_bottom(bottom);
            heightmap.set_liquid_top(top);
        }
        self.set_heightmap(x, z, heightmap);
    }

    /// Number of voxels the mesher may visit: the sum of `top + 1` over interior
    /// columns. Buffer reservations are derived from this.
    pub fn renderable_voxel_count(&self) -> usize {
        let mut count = 0;
        for x in 1..=CHUNK_WIDTH {
            for z in 1..=CHUNK_WIDTH {
                count += self.get_heightmap(x, z).column_top() as usize + 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::VoxelType;

    #[test]
    fn columns_are_contiguous_in_y() {
        assert_eq!(ChunkData::voxel_index(0, 1, 0), 1);
        assert_eq!(ChunkData::voxel_index(0, 0, 1), CHUNK_HEIGHT);
        assert_eq!(
            ChunkData::voxel_index(1, 0, 0),
            CHUNK_WIDTH_WRAPPED * CHUNK_HEIGHT
        );
        assert_eq!(
            ChunkData::voxel_index(CHUNK_WIDTH_WRAPPED - 1, CHUNK_HEIGHT - 1, CHUNK_WIDTH_WRAPPED - 1),
            CHUNK_VOXELS_WRAPPED - 1
        );
    }

    #[test]
    fn recalculated_heightmap_tracks_solid_and_liquid() {
        let mut data = ChunkData::new();
        for y in 0..=5 {
            data.set_voxel(3, y, 4, Voxel::new(VoxelType::STONE));
        }
        for y in 6..=9 {
            data.set_voxel(3, y, 4, Voxel::new(VoxelType::WATER));
        }
        data.recalculate_heightmap(3, 4);

        let heightmap = data.get_heightmap(3, 4);
        assert_eq!(heightmap.get_solid(), 5);
        assert_eq!(heightmap.get_liquid_bottom(), 6);
        assert_eq!(heightmap.get_liquid_top(), 9);
    }

    #[test]
    fn outside_the_vertical_range_counts_as_empty() {
        let mut data = ChunkData::new();
        data.set_voxel(1, 0, 1, Voxel::new(VoxelType::BEDROCK));
        assert!(!data.is_empty_at(1, 0, 1));
        assert!(data.is_empty_at(1, -1, 1));
        assert!(data.is_empty_at(1, CHUNK_HEIGHT as i32, 1));
    }
}
