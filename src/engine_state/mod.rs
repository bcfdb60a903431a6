//! # Engine State Module
//!
//! The state of the terrain core and the single object that owns it.
//!
//! ## Key Components
//!
//! * `WorldContext` - Constructed once at startup, owns every subsystem below
//! * `settings` - Serde configuration for the streaming window and terrain generation
//! * `rendering` - Packed vertex format plus render mesh and collider generation
//! * `task_management` - Worker threads and typed task handles
//! * `voxels` - Voxel data, chunks, generation jobs and the chunks manager
//!
//! ## Architecture
//!
//! Nothing in the core is global. `WorldContext` creates the worker pool, the terrain
//! generator, the in-flight counter, the chunk factory and the chunks manager, and wires
//! them together by handing out clones of the shared pieces. The caller drives it from a
//! single control thread with one [`WorldContext::update`] per frame.

use std::sync::Arc;

use cgmath::Point3;
use log::{debug, info};

use crate::core::InFlightCounter;
use crate::error::EngineError;
use settings::{EngineConfig, WorldSettings};
use task_management::{default_worker_count, TaskManager};
use voxels::block::Voxel;
use voxels::chunk::{world_to_chunk_position, ChunkPosition, CHUNK_WIDTH};
use voxels::generation::TerrainGenerator;
use voxels::storage::MemoryChunkStore;
use voxels::tasks::ChunkFactory;
use voxels::ChunksManager;

pub mod rendering;
pub mod settings;
pub mod task_management;
pub mod voxels;

/// Owner of the whole terrain core.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_terrain::{EngineConfig, WorldContext};
///
/// let mut config = EngineConfig::default();
/// config.world.render_distance = 1;
/// config.world.worker_threads = Some(1);
///
/// let mut world = WorldContext::new(config)?;
/// world.update(Point3::new(8.0, 60.0, 8.0), 0.016);
/// assert_eq!(world.current_chunk_position(), Some(Point3::new(0, 0, 0)));
/// # Ok::<(), voxel_terrain::error::EngineError>(())
/// ```
pub struct WorldContext {
    config: EngineConfig,
    task_manager: TaskManager,
    generator: Arc<TerrainGenerator>,
    chunks: ChunksManager,
    /// Chunk coordinate of the viewpoint at the last update
    current_chunk_position: Option<ChunkPosition>,
}

impl WorldContext {
    /// Validates `config` and builds every subsystem.
    ///
    /// # Arguments
    ///
    /// * `config` - World settings and generation parameters
    ///
    /// # Returns
    ///
    /// The context, or the validation error of the first invalid setting
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let worker_count = config
            .world
            .worker_threads
            .unwrap_or_else(default_worker_count);
        let task_manager = TaskManager::new(worker_count);
        let generator = Arc::new(TerrainGenerator::new(config.generation.clone()));
        let factory = ChunkFactory::new(
            &config.world,
            generator.clone(),
            task_manager.clone(),
            InFlightCounter::new(),
        );
        let store = Box::new(MemoryChunkStore::new(config.world.store_capacity));
        let chunks = ChunksManager::new(config.world.clone(), factory, store);

        info!(
            "World context created: render distance {}, cache distance {}, {} workers",
            config.world.render_distance,
            config.world.cache_distance,
            task_manager.worker_count()
        );

        Ok(WorldContext {
            config,
            task_manager,
            generator,
            chunks,
            current_chunk_position: None,
        })
    }

    /// Advances the world by one frame.
    ///
    /// The chunk window is rebuilt only when `viewpoint` has entered a different chunk
    /// since the previous update.
    ///
    /// # Arguments
    ///
    /// * `viewpoint` - World-space position the terrain streams around
    /// * `delta` - Seconds since the previous update
    ///
    /// # Returns
    ///
    /// `true` if the chunk window moved
    pub fn update(&mut self, viewpoint: Point3<f32>, delta: f32) -> bool {
        let chunk_position = world_to_chunk_position(viewpoint);
        let moved = self.current_chunk_position != Some(chunk_position);
        if moved {
            debug!("Viewpoint entered chunk {:?}", chunk_position);
            self.chunks.update_chunks(chunk_position);
            self.current_chunk_position = Some(chunk_position);
        }
        self.chunks.tick(delta);
        moved
    }

    /// Replaces the world settings at runtime.
    ///
    /// The worker count and store capacity are fixed at construction; changes to them
    /// take effect on the next context.
    pub fn apply_settings(&mut self, settings: WorldSettings) -> Result<(), EngineError> {
        settings.validate()?;
        self.chunks.apply_settings(settings.clone());
        self.config.world = settings;
        Ok(())
    }

    /// Reads the voxel at a world voxel coordinate from the loaded chunks.
    pub fn voxel_at(&self, x: i32, y: i32, z: i32) -> Result<Voxel, EngineError> {
        let (position, local_x, local_z) = split_world_coordinates(x, z);
        if !(0..voxels::chunk::CHUNK_HEIGHT as i32).contains(&y) {
            return Err(EngineError::VoxelOutOfBounds(local_x, y, local_z));
        }
        let data = self
            .chunks
            .get_chunk(position)
            .ok_or(EngineError::ChunkNotFound(position))?
            .data()
            .ok_or(EngineError::ChunkNotReady(position))?;
        Ok(data.get_voxel(local_x as usize + 1, y as usize, local_z as usize + 1))
    }

    /// Writes the voxel at a world voxel coordinate and schedules the affected chunks
    /// for regeneration.
    pub fn set_voxel(&mut self, x: i32, y: i32, z: i32, voxel: Voxel) -> Result<(), EngineError> {
        let (position, local_x, local_z) = split_world_coordinates(x, z);
        self.chunks.edit_voxel(position, local_x, y, local_z, voxel)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn chunks(&self) -> &ChunksManager {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut ChunksManager {
        &mut self.chunks
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.task_manager
    }

    pub fn current_chunk_position(&self) -> Option<ChunkPosition> {
        self.current_chunk_position
    }
}

/// Splits world voxel x/z into the chunk coordinate and the chunk-local x/z.
fn split_world_coordinates(x: i32, z: i32) -> (ChunkPosition, i32, i32) {
    let width = CHUNK_WIDTH as i32;
    (
        Point3::new(x.div_euclid(width), 0, z.div_euclid(width)),
        x.rem_euclid(width),
        z.rem_euclid(width),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::VoxelType;

    fn small_world() -> WorldContext {
        let mut config = EngineConfig::default();
        config.world.render_distance = 1;
        config.world.cache_distance = 1;
        config.world.worker_threads = Some(2);
        config.world.time_to_load_next_chunks = 0.0;
        config.world.chunks_processed = 16;
        config.world.chunks_to_load_per_tick = 16;
        WorldContext::new(config).unwrap()
    }

    fn settle(world: &mut WorldContext, viewpoint: Point3<f32>) {
        for _ in 0..10_000 {
            world.update(viewpoint, 0.016);
            if world.chunks().is_idle() {
                return;
            }
            std::thread::yield_now();
        }
        panic!("world did not settle");
    }

    #[test]
    fn world_coordinates_split_towards_negative_infinity() {
        assert_eq!(split_world_coordinates(17, -1), (Point3::new(1, 0, -1), 1, 15));
        assert_eq!(split_world_coordinates(-16, 0), (Point3::new(-1, 0, 0), 0, 0));
    }

    #[test]
    fn the_window_only_moves_across_chunk_boundaries() {
        let mut world = small_world();
        assert!(world.update(Point3::new(1.0, 50.0, 1.0), 0.016));
        assert!(!world.update(Point3::new(15.0, 50.0, 15.0), 0.016));
        assert!(world.update(Point3::new(16.5, 50.0, 15.0), 0.016));
        assert_eq!(world.current_chunk_position(), Some(Point3::new(1, 0, 0)));
    }

    #[test]
    fn voxels_are_read_and_written_in_world_space() {
        let mut world = small_world();
        settle(&mut world, Point3::new(8.0, 50.0, 8.0));

        let height = world.generator().height_at(-1, 5) as i32;
        assert!(world.voxel_at(-1, height, 5).unwrap().is_solid());

        world
            .set_voxel(-1, 127, 5, Voxel::new(VoxelType::SNOW))
            .unwrap();
        assert_eq!(
            world.voxel_at(-1, 127, 5).unwrap().get_voxel_type(),
            VoxelType::SNOW
        );
        assert!(matches!(
            world.voxel_at(200, 10, 0),
            Err(EngineError::ChunkNotFound(_))
        ));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut world = small_world();
        let mut settings = world.config().world.clone();
        settings.chunks_processed = 0;
        assert!(world.apply_settings(settings).is_err());

        let mut config = EngineConfig::default();
        config.world.render_distance = -1;
        assert!(WorldContext::new(config).is_err());
    }
}
