//! # Terrain Generator
//!
//! Fills chunk data from a layered 2D height function.
//!
//! ## Height function
//!
//! Every enabled [`NoiseLayer`] is sampled as fractal Perlin noise normalized to
//! `[0, 1]`. A mask layer contributes no height; when its sample falls below the layer's
//! threshold every later layer is switched off for that column. The weighted mean of the
//! contributing samples is shaped with `powf(steepness)` and mapped onto
//! `[1, CHUNK_HEIGHT - 2]`.
//!
//! ## Column fill
//!
//! From the bottom up: bedrock at `y = 0`, stone, a few voxels of soil, then the surface
//! voxel (sand on beaches, snow on mountains, grass elsewhere). Water fills the gap
//! between a submerged surface and the sea level.
//!
//! Generation is deterministic for a given seed, parameter set and chunk coordinate,
//! border columns included, so neighboring chunks agree on their shared edges.

use noise::{NoiseFn, Perlin};

use crate::engine_state::settings::{GenerationParameters, NoiseLayer};
use crate::engine_state::voxels::block::{block_type::VoxelType, Voxel};
use crate::engine_state::voxels::chunk::{
    ChunkData, ChunkPosition, CHUNK_HEIGHT, CHUNK_WIDTH, CHUNK_WIDTH_WRAPPED,
};
use crate::engine_state::voxels::height_map::HeightMap;

/// Range of the random per-octave sample offsets.
const OCTAVE_OFFSET_RANGE: f64 = 10_000.0;

/// Generates chunk data from [`GenerationParameters`].
///
/// Immutable once built; one instance is shared by every worker through an `Arc`.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    parameters: GenerationParameters,
    perlin: Perlin,
    /// Sample offsets, per layer then per octave.
    octave_offsets: Vec<Vec<[f64; 2]>>,
}

impl TerrainGenerator {
    /// Builds a generator, deriving every octave offset from the seed.
    pub fn new(parameters: GenerationParameters) -> Self {
        let mut rng = fastrand::Rng::with_seed(parameters.seed as u64);
        let octave_offsets = parameters
            .layers
            .iter()
            .map(|layer| {
                (0..layer.octaves)
                    .map(|_| {
                        [
                            (rng.f64() * 2.0 - 1.0) * OCTAVE_OFFSET_RANGE,
                            (rng.f64() * 2.0 - 1.0) * OCTAVE_OFFSET_RANGE,
                        ]
                    })
                    .collect()
            })
            .collect();

        TerrainGenerator {
            perlin: Perlin::new(parameters.seed),
            parameters,
            octave_offsets,
        }
    }

    pub fn parameters(&self) -> &GenerationParameters {
        &self.parameters
    }

    /// Fractal noise of one layer at a world column, normalized to `[0, 1]`.
    fn sample_layer(&self, layer_index: usize, layer: &NoiseLayer, world_x: f64, world_z: f64) -> f64 {
        let scale = layer.scale * self.parameters.global_scale;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut max_amplitude = 0.0;

        for offset in &self.octave_offsets[layer_index] {
            let sample = self.perlin.get([
                world_x / scale * frequency + offset[0],
                world_z / scale * frequency + offset[1],
            ]);
            total += sample * amplitude;
            max_amplitude += amplitude;
            amplitude *= layer.persistence;
            frequency *= layer.lacunarity;
        }

        if max_amplitude <= 0.0 {
            return 0.0;
        }
        ((total / max_amplitude + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Surface height of the world column `(world_x, world_z)`, in `[1, CHUNK_HEIGHT - 2]`.
    pub fn height_at(&self, world_x: i32, world_z: i32) -> u32 {
        let (world_x, world_z) = (world_x as f64, world_z as f64);
        let mut weighted = 0.0;
        let mut total_weight = 0.0;

        for (index, layer) in self.parameters.layers.iter().enumerate() {
            if !layer.enabled {
                continue;
            }
            let sample = self.sample_layer(index, layer, world_x, world_z);
            if layer.use_as_mask {
                if sample < layer.mask_threshold {
                    break;
                }
                continue;
            }
            weighted += sample * layer.weight;
            total_weight += layer.weight;
        }

        let value = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };
        let shaped = value.clamp(0.0, 1.0).powf(self.parameters.steepness);
        let span = (CHUNK_HEIGHT - 3) as f64;
        1 + (shaped * span).round() as u32
    }

    /// Generates the voxels and heightmaps of the chunk at `position`, border included.
    pub fn generate(&self, position: ChunkPosition) -> ChunkData {
        let mut data = ChunkData::new();
        let origin_x = position.x * CHUNK_WIDTH as i32 - 1;
        let origin_z = position.z * CHUNK_WIDTH as i32 - 1;

        for x in 0..CHUNK_WIDTH_WRAPPED {
            for z in 0..CHUNK_WIDTH_WRAPPED {
                let height = self.height_at(origin_x + x as i32, origin_z + z as i32);
                self.fill_column(&mut data, x, z, height);
            }
        }
        data
    }

    /// Writes one column with surface height `height` and its heightmap.
    fn fill_column(&self, data: &mut ChunkData, x: usize, z: usize, height: u32) {
        let parameters = &self.parameters;
        let sea_level = parameters.sea_level;

        let surface = if height <= sea_level + parameters.beach_height {
            VoxelType::SAND
        } else if height >= parameters.mountain_height {
            VoxelType::SNOW
        } else {
            VoxelType::GRASS
        };
        let soil = match surface {
            VoxelType::SAND => Some(VoxelType::SAND),
            VoxelType::GRASS => Some(VoxelType::DIRT),
            _ => None,
        };
        let soil_bottom = height.saturating_sub(parameters.top_soil_thickness);

        let column_top = height.max(sea_level).min(CHUNK_HEIGHT as u32 - 1);
        for y in 0..=column_top {
            let voxel_type = if y == 0 {
                VoxelType::BEDROCK
            } else if y == height {
                surface
            } else if y < height {
                match soil {
                    Some(soil) if y >= soil_bottom => soil,
                    _ => VoxelType::STONE,
                }
            } else {
                VoxelType::WATER
            };
            data.set_voxel(x, y as usize, z, Voxel::new(voxel_type));
        }

        let mut heightmap = HeightMap::default();
        heightmap.set_solid(height);
        if height < sea_level {
            heightmap.set_liquid_bottom(height + 1);
            heightmap.set_liquid_top(sea_level);
        }
        data.set_heightmap(x, z, heightmap);
    }
}
