//! # Chunks Manager
//!
//! This module provides the `ChunksManager`, which owns every chunk instance and moves
//! them through their lifecycle as the viewpoint travels.
//!
//! ## Chunk sets
//!
//! Each chunk instance lives in exactly one place:
//! - `active`: inside the render distance, visible
//! - `cached`: outside the render distance but within the cache ring, hidden
//! - `generating`: freshly assigned instances waiting for their first generation result
//! - the clear queue: evicted instances waiting to be released, one per tick. Edited
//!   data is saved to the store before a chunk enters the queue
//! - `pool`: cleared instances ready for reuse
//!
//! The three keyed sets never share a coordinate. A chunk that is regenerated in place
//! (after an edit) stays in its set and only carries the generating flag.
//!
//! ## Per-frame flow
//!
//! 1. `update_chunks` runs when the viewpoint enters a new chunk: it rebuilds the active
//!    set, requests missing chunks and evicts the ones that left the cache ring
//! 2. `tick` runs every frame: it clears one evicted chunk, starts the jobs the factory
//!    admits, and applies the results of finished jobs
//!
//! All of this happens on the control thread; workers only ever see owned copies.

use std::collections::{HashMap, VecDeque};

use log::{debug, error, info, warn};

use crate::engine_state::rendering::meshing::GeometrySize;
use crate::engine_state::settings::WorldSettings;
use crate::engine_state::voxels::block::Voxel;
use crate::engine_state::voxels::chunk::{
    chebyshev_distance, normalize_position, Chunk, ChunkId, ChunkPosition, CHUNK_HEIGHT,
    CHUNK_WIDTH, CHUNK_WIDTH_WRAPPED,
};
use crate::engine_state::voxels::distance_filter::DistanceFilter;
use crate::engine_state::voxels::generation::{GenerationData, GenerationStages};
use crate::engine_state::voxels::storage::ChunkStore;
use crate::engine_state::voxels::tasks::{ChunkFactory, GeneratedChunk, JobOutcome};
use crate::error::EngineError;

/// Snapshot of the manager's bookkeeping, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunksManagerStats {
    pub active: usize,
    pub cached: usize,
    pub generating: usize,
    pub pooled: usize,
    pub pending_clear: usize,
    pub in_flight: usize,
    pub pending_bulk: usize,
    pub pending_priority: usize,
    pub stored: usize,
    /// Chunk instances created since startup.
    pub allocated: usize,
    /// Chunk assignments served from the pool.
    pub reused: usize,
    pub mesh_size: GeometrySize,
    pub collider_size: GeometrySize,
}

/// Owns every chunk and drives the generation pipeline around a moving center.
pub struct ChunksManager {
    active: HashMap<ChunkPosition, Chunk>,
    cached: HashMap<ChunkPosition, Chunk>,
    generating: HashMap<ChunkPosition, Chunk>,
    pool: Vec<Chunk>,
    clear_queue: VecDeque<Chunk>,
    distance_filter: DistanceFilter,
    factory: ChunkFactory,
    store: Box<dyn ChunkStore>,
    settings: WorldSettings,
    center: Option<ChunkPosition>,
    mesh_size: GeometrySize,
    collider_size: GeometrySize,
    next_id: ChunkId,
    allocated: usize,
    reused: usize,
}

impl std::fmt::Debug for ChunksManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunksManager")
            .field("center", &self.center)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ChunksManager {
    /// Creates a manager with empty sets.
    ///
    /// # Arguments
    /// * `settings` - Streaming window settings; the factory is expected to use the same
    /// * `factory` - Runs the generation jobs
    /// * `store` - Receives edited chunks when they are evicted
    pub fn new(settings: WorldSettings, factory: ChunkFactory, store: Box<dyn ChunkStore>) -> Self {
        ChunksManager {
            active: HashMap::new(),
            cached: HashMap::new(),
            generating: HashMap::new(),
            pool: Vec::with_capacity(settings.pool_capacity()),
            clear_queue: VecDeque::new(),
            distance_filter: DistanceFilter::new(settings.render_distance),
            factory,
            store,
            settings,
            center: None,
            mesh_size: GeometrySize::default(),
            collider_size: GeometrySize::default(),
            next_id: 0,
            allocated: 0,
            reused: 0,
        }
    }

    /// Rebuilds the chunk sets around `center`.
    ///
    /// 1. Every active chunk becomes cached
    /// 2. Each coordinate of the render window, nearest first, either reactivates its
    ///    cached chunk, is skipped because its job is running, or is requested. Requested
    ///    coordinates are assigned a chunk in the generating set right away
    /// 3. The requests replace the factory's pending bulk batch; generating chunks whose
    ///    request was dropped by the replacement are recycled
    /// 4. Cached chunks at or beyond `render + cache` are evicted to the clear queue and
    ///    their jobs cancelled. Edited data goes to the store at this point
    /// 5. The remaining cached chunks are hidden
    pub fn update_chunks(&mut self, center: ChunkPosition) {
        let center = normalize_position(center);
        self.center = Some(center);

        let previously_active = std::mem::take(&mut self.active);
        self.cached.extend(previously_active);

        let offsets = self.distance_filter.offsets().to_vec();
        let mut requests = Vec::new();
        for offset in offsets {
            let position = center + offset;
            if let Some(mut chunk) = self.cached.remove(&position) {
                chunk.set_visible(true);
                self.active.insert(position, chunk);
            } else if !self.factory.is_running(position) {
                self.set_chunk_to_generating(position);
                requests.push(GenerationData::full(position));
            }
        }
        let requested = requests.len();

        let replaced = self.factory.submit_bulk(requests);
        let mut dropped = 0;
        for request in replaced {
            let position = request.position;
            if self.factory.is_running(position) || self.in_window(position) {
                continue;
            }
            if let Some(chunk) = self.generating.remove(&position) {
                self.retire(chunk);
                dropped += 1;
            }
        }

        let eviction_distance = self.settings.render_distance + self.settings.cache_distance;
        let evicted: Vec<ChunkPosition> = self
            .cached
            .keys()
            .filter(|position| chebyshev_distance(**position, center) >= eviction_distance)
            .copied()
            .collect();
        for position in &evicted {
            if let Some(chunk) = self.cached.remove(position) {
                self.factory.cancel(*position);
                self.retire(chunk);
            }
        }

        for chunk in self.cached.values_mut() {
            chunk.set_visible(false);
        }

        info!(
            "Chunk window moved to ({}, {}): {} active, {} cached, {} requested, {} evicted, {} dropped",
            center.x,
            center.z,
            self.active.len(),
            self.cached.len(),
            requested,
            evicted.len(),
            dropped
        );
    }

    /// Whether `position` lies within the render distance of the current center.
    fn in_window(&self, position: ChunkPosition) -> bool {
        self.center.is_some_and(|center| {
            chebyshev_distance(position, center) <= self.settings.render_distance
        })
    }

    /// Advances the manager by one frame.
    ///
    /// # Arguments
    /// * `delta` - Seconds since the previous tick
    pub fn tick(&mut self, delta: f32) {
        self.clear_next_chunk();

        for request in self.factory.admit(delta) {
            self.start_request(request);
        }

        for outcome in self.factory.poll() {
            self.apply_outcome(outcome);
        }
    }

    /// Saves the chunk's edited data, if any, and queues it for clearing.
    ///
    /// The store is written right away so that a request for the same coordinate,
    /// issued before the chunk is cleared, already finds the edits.
    fn retire(&mut self, mut chunk: Chunk) {
        if let (Some(position), Some(data)) = (chunk.position(), chunk.take_modified_data()) {
            debug!("Saving edited chunk {:?}", position);
            self.store.save(position, data);
        }
        chunk.set_generating(false);
        chunk.set_visible(false);
        self.clear_queue.push_back(chunk);
    }

    /// Releases one chunk from the clear queue, into the pool while it has room.
    fn clear_next_chunk(&mut self) {
        let Some(mut chunk) = self.clear_queue.pop_front() else {
            return;
        };

        self.update_chunk_mesh_size(chunk.mesh_size(), GeometrySize::default());
        self.update_chunk_collider_size(chunk.collider_size(), GeometrySize::default());
        chunk.clear();

        if self.pool.len() < self.settings.pool_capacity() {
            self.pool.push(chunk);
        } else {
            debug!("Chunk pool full, releasing chunk {}", chunk.id());
        }
    }

    /// Turns an admitted request into a running job.
    fn start_request(&mut self, request: GenerationData) {
        let position = request.position;
        if self.factory.is_disposed() {
            warn!(
                "Dropping {:?} for chunk {:?}, the chunk factory is disposed",
                request.stages, position
            );
            return;
        }

        if request.is_full() {
            if self.get_chunk(position).is_some_and(|chunk| chunk.data().is_some())
                || self.factory.is_running(position)
            {
                debug!("Chunk {:?} already generated, skipping request", position);
                return;
            }
            let chunk_id = self.set_chunk_to_generating(position);
            let stored = self.store.load(position);
            if stored.is_some() {
                if let Some(chunk) = self.generating.get_mut(&position) {
                    chunk.mark_modified();
                }
            }
            if !self.factory.start(request, chunk_id, stored, 0) {
                if let Some(chunk) = self.generating.remove(&position) {
                    self.retire(chunk);
                }
            }
            return;
        }

        let Some(chunk) = self.get_chunk(position) else {
            debug!("Dropping {:?} for unloaded chunk {:?}", request.stages, position);
            return;
        };
        if chunk.is_generating() {
            // Retried once the running job has delivered.
            self.factory.enqueue_priority(request);
            return;
        }
        let Some(snapshot) = chunk.data().cloned() else {
            warn!("{}", EngineError::ChunkNotReady(position));
            return;
        };
        let revision = chunk.revision();
        let chunk_id = chunk.id();
        if self.factory.start(request, chunk_id, Some(snapshot), revision) {
            self.set_chunk_to_generating(position);
        }
    }

    /// Applies a finished job to its chunk.
    fn apply_outcome(&mut self, outcome: JobOutcome) {
        let JobOutcome {
            position,
            chunk_id,
            result,
        } = outcome;

        if self.get_chunk(position).map(Chunk::id) != Some(chunk_id) {
            warn!(
                "Dropping result for chunk {}: {}",
                chunk_id,
                EngineError::ChunkNotFound(position)
            );
            return;
        }

        match result {
            Ok(generated) => self.upload_generated(generated),
            Err(e) => {
                match &e {
                    EngineError::GenerationCancelled(_) => debug!("{}", e),
                    _ => error!("{}", e),
                }
                if let Some(chunk) = self.generating.remove(&position) {
                    // Never received data; free the coordinate for a new request.
                    self.retire(chunk);
                } else if let Some(chunk) = self.get_chunk_mut(position) {
                    chunk.set_generating(false);
                }
            }
        }
    }

    fn upload_generated(&mut self, generated: GeneratedChunk) {
        let GeneratedChunk {
            position,
            stages,
            data,
            mesh,
            collider,
            revision,
            ..
        } = generated;

        let Some(chunk) = self.get_chunk_mut(position) else {
            return;
        };
        let stale = chunk.data().is_some() && chunk.revision() != revision;
        let data = if chunk.data().is_none() || stages.contains(GenerationStages::DATA) {
            Some(data)
        } else {
            None
        };
        let swap = chunk.upload(data, mesh, collider);

        self.update_chunk_mesh_size(swap.old_mesh, swap.new_mesh);
        self.update_chunk_collider_size(swap.old_collider, swap.new_collider);
        self.complete_generating_chunk(position);

        if stale {
            debug!("Chunk {:?} was edited during regeneration, queueing again", position);
            self.factory
                .enqueue_priority(GenerationData::new(position, stages));
        }
    }

    /// Looks a chunk up in the active, cached and generating sets, in that order.
    pub fn get_chunk(&self, position: ChunkPosition) -> Option<&Chunk> {
        self.active
            .get(&position)
            .or_else(|| self.cached.get(&position))
            .or_else(|| self.generating.get(&position))
    }

    /// Mutable counterpart of [`get_chunk`](Self::get_chunk).
    pub fn get_chunk_mut(&mut self, position: ChunkPosition) -> Option<&mut Chunk> {
        self.active
            .get_mut(&position)
            .or_else(|| self.cached.get_mut(&position))
            .or_else(|| self.generating.get_mut(&position))
    }

    /// Marks the chunk at `position` as generating.
    ///
    /// A known coordinate is flagged in place. An unknown one gets a pooled instance, or
    /// a new one when the pool is empty, which is assigned under a fresh id and put in the
    /// generating set. Results of jobs started for an earlier assignment no longer match.
    ///
    /// # Returns
    /// The id of the chunk instance now responsible for `position`.
    pub fn set_chunk_to_generating(&mut self, position: ChunkPosition) -> ChunkId {
        let position = normalize_position(position);
        if let Some(chunk) = self.get_chunk_mut(position) {
            chunk.set_generating(true);
            return chunk.id();
        }

        let id = self.next_id;
        self.next_id += 1;
        let mut chunk = match self.pool.pop() {
            Some(chunk) => {
                self.reused += 1;
                chunk
            }
            None => {
                self.allocated += 1;
                Chunk::new(id)
            }
        };
        chunk.assign(id, position);
        chunk.set_generating(true);
        self.generating.insert(position, chunk);
        id
    }

    /// Ends generation of the chunk at `position`.
    ///
    /// A chunk from the generating set becomes active when it lies within the render
    /// distance of the current center, cached when it lies within the cache ring, and is
    /// queued for clearing otherwise. A chunk regenerated in place just loses its flag.
    ///
    /// # Returns
    /// `false` if no generating chunk exists at `position`.
    pub fn complete_generating_chunk(&mut self, position: ChunkPosition) -> bool {
        let position = normalize_position(position);
        let Some(mut chunk) = self.generating.remove(&position) else {
            return match self.get_chunk_mut(position) {
                Some(chunk) if chunk.is_generating() => {
                    chunk.set_generating(false);
                    true
                }
                _ => false,
            };
        };
        chunk.set_generating(false);

        let distance = self
            .center
            .map_or(0, |center| chebyshev_distance(position, center));
        if distance <= self.settings.render_distance {
            chunk.set_visible(true);
            self.active.insert(position, chunk);
        } else if distance < self.settings.render_distance + self.settings.cache_distance {
            chunk.set_visible(false);
            self.cached.insert(position, chunk);
        } else {
            self.retire(chunk);
        }
        true
    }

    /// Writes one voxel of a loaded chunk and schedules regeneration of its geometry.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinate
    /// * `x`, `y`, `z` - Chunk-local voxel coordinates, `x` and `z` in `0..CHUNK_WIDTH`
    /// * `voxel` - The new voxel
    ///
    /// Edits on the chunk's edge are mirrored into the border of every loaded neighbor,
    /// which is regenerated as well.
    pub fn edit_voxel(
        &mut self,
        position: ChunkPosition,
        x: i32,
        y: i32,
        z: i32,
        voxel: Voxel,
    ) -> Result<(), EngineError> {
        let width = CHUNK_WIDTH as i32;
        if !(0..width).contains(&x) || !(0..CHUNK_HEIGHT as i32).contains(&y) || !(0..width).contains(&z) {
            return Err(EngineError::VoxelOutOfBounds(x, y, z));
        }
        let position = normalize_position(position);
        let chunk = self
            .get_chunk_mut(position)
            .ok_or(EngineError::ChunkNotFound(position))?;
        if chunk.data().is_none() {
            return Err(EngineError::ChunkNotReady(position));
        }

        let (wrapped_x, wrapped_z) = (x + 1, z + 1);
        let regenerate = GenerationStages::MESH | GenerationStages::COLLIDER;
        Self::write_wrapped(chunk, wrapped_x, y, wrapped_z, voxel);
        self.factory
            .enqueue_priority(GenerationData::new(position, regenerate));

        let wrapped_width = CHUNK_WIDTH_WRAPPED as i32;
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                let neighbor_x = wrapped_x - dx * width;
                let neighbor_z = wrapped_z - dz * width;
                if !(0..wrapped_width).contains(&neighbor_x) || !(0..wrapped_width).contains(&neighbor_z) {
                    continue;
                }
                let neighbor_position = ChunkPosition::new(position.x + dx, 0, position.z + dz);
                let Some(neighbor) = self.get_chunk_mut(neighbor_position) else {
                    continue;
                };
                if neighbor.data().is_none() {
                    continue;
                }
                Self::write_wrapped(neighbor, neighbor_x, y, neighbor_z, voxel);
                self.factory
                    .enqueue_priority(GenerationData::new(neighbor_position, regenerate));
            }
        }
        Ok(())
    }

    /// Writes a voxel at a wrapped coordinate and refreshes that column's heightmap.
    fn write_wrapped(chunk: &mut Chunk, x: i32, y: i32, z: i32, voxel: Voxel) {
        if let Some(data) = chunk.edit_data() {
            let (x, y, z) = (x as usize, y as usize, z as usize);
            data.set_voxel(x, y, z, voxel);
            data.recalculate_heightmap(x, z);
        }
    }

    /// Applies new window settings.
    ///
    /// The distance filter is rebuilt only when the render distance changed. A changed
    /// window reruns [`update_chunks`](Self::update_chunks) around the current center.
    pub fn apply_settings(&mut self, settings: WorldSettings) {
        let window_changed = settings.render_distance != self.settings.render_distance
            || settings.cache_distance != self.settings.cache_distance;
        self.distance_filter.update(settings.render_distance);
        self.factory.apply_settings(&settings);
        self.settings = settings;

        let capacity = self.settings.pool_capacity();
        if self.pool.len() > capacity {
            self.pool.truncate(capacity);
        }

        if window_changed {
            if let Some(center) = self.center {
                self.update_chunks(center);
            }
        }
    }

    /// Aggregate (render mesh, collider) sizes over every chunk holding geometry.
    pub fn chunks_mesh_and_collider_size(&self) -> (GeometrySize, GeometrySize) {
        (self.mesh_size, self.collider_size)
    }

    /// Replaces a chunk's old render mesh size by its new one in the aggregate.
    pub fn update_chunk_mesh_size(&mut self, old: GeometrySize, new: GeometrySize) {
        self.mesh_size = self.mesh_size.swap(old, new);
    }

    /// Replaces a chunk's old collider size by its new one in the aggregate.
    pub fn update_chunk_collider_size(&mut self, old: GeometrySize, new: GeometrySize) {
        self.collider_size = self.collider_size.swap(old, new);
    }

    pub fn center(&self) -> Option<ChunkPosition> {
        self.center
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// The chunks inside the render distance.
    pub fn active_chunks(&self) -> impl Iterator<Item = (&ChunkPosition, &Chunk)> {
        self.active.iter()
    }

    pub fn is_active(&self, position: ChunkPosition) -> bool {
        self.active.contains_key(&position)
    }

    pub fn is_cached(&self, position: ChunkPosition) -> bool {
        self.cached.contains_key(&position)
    }

    pub fn is_generating(&self, position: ChunkPosition) -> bool {
        self.generating.contains_key(&position)
    }

    /// The coordinates of the active, cached and generating sets.
    pub fn positions(&self) -> (Vec<ChunkPosition>, Vec<ChunkPosition>, Vec<ChunkPosition>) {
        (
            self.active.keys().copied().collect(),
            self.cached.keys().copied().collect(),
            self.generating.keys().copied().collect(),
        )
    }

    /// Stops the generation pipeline.
    ///
    /// The factory is disposed, chunks regenerating in place lose their flag and chunks
    /// still waiting for their first result are recycled. Later requests are dropped.
    /// Disposing twice does nothing.
    pub fn dispose(&mut self) {
        if self.factory.is_disposed() {
            return;
        }
        self.factory.dispose();
        for chunk in self.active.values_mut().chain(self.cached.values_mut()) {
            chunk.set_generating(false);
        }
        let waiting: Vec<Chunk> = self.generating.drain().map(|(_, chunk)| chunk).collect();
        let recycled = waiting.len();
        for chunk in waiting {
            self.retire(chunk);
        }
        info!("Chunks manager disposed, {} generating chunks recycled", recycled);
    }

    /// Whether no job is running or waiting to run and no chunk waits to be cleared.
    pub fn is_idle(&self) -> bool {
        self.factory.in_flight() == 0
            && self.factory.pending_bulk() == 0
            && self.factory.pending_priority() == 0
            && self.generating.is_empty()
            && self.clear_queue.is_empty()
    }

    pub fn stats(&self) -> ChunksManagerStats {
        ChunksManagerStats {
            active: self.active.len(),
            cached: self.cached.len(),
            generating: self.generating.len(),
            pooled: self.pool.len(),
            pending_clear: self.clear_queue.len(),
            in_flight: self.factory.in_flight(),
            pending_bulk: self.factory.pending_bulk(),
            pending_priority: self.factory.pending_priority(),
            stored: self.store.len(),
            allocated: self.allocated,
            reused: self.reused,
            mesh_size: self.mesh_size,
            collider_size: self.collider_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cgmath::Point3;

    use crate::core::InFlightCounter;
    use crate::engine_state::settings::GenerationParameters;
    use crate::engine_state::task_management::TaskManager;
    use crate::engine_state::voxels::block::block_type::VoxelType;
    use crate::engine_state::voxels::generation::TerrainGenerator;
    use crate::engine_state::voxels::storage::MemoryChunkStore;

    fn manager(render_distance: i32, cache_distance: i32) -> ChunksManager {
        let settings = WorldSettings {
            render_distance,
            cache_distance,
            chunks_processed: 64,
            chunks_to_load_per_tick: 64,
            time_to_load_next_chunks: 0.0,
            ..WorldSettings::default()
        };
        let factory = ChunkFactory::new(
            &settings,
            Arc::new(TerrainGenerator::new(GenerationParameters::default())),
            TaskManager::new(0),
            InFlightCounter::new(),
        );
        ChunksManager::new(settings, factory, Box::new(MemoryChunkStore::new(16)))
    }

    fn drain(manager: &mut ChunksManager) {
        for _ in 0..1000 {
            manager.tick(0.016);
            if manager.is_idle() {
                return;
            }
        }
        panic!("pipeline did not settle");
    }

    #[test]
    fn the_window_fills_after_a_few_ticks() {
        let mut manager = manager(1, 1);
        manager.update_chunks(Point3::new(0, 0, 0));
        drain(&mut manager);

        assert_eq!(manager.stats().active, 9);
        for x in -1..=1 {
            for z in -1..=1 {
                let chunk = manager.get_chunk(Point3::new(x, 0, z)).unwrap();
                assert!(chunk.is_visible());
                assert!(chunk.mesh().is_some() && chunk.collider().is_some());
            }
        }
        let (mesh_size, _) = manager.chunks_mesh_and_collider_size();
        let expected: usize = manager.active_chunks().map(|(_, c)| c.mesh_size().vertices).sum();
        assert_eq!(mesh_size.vertices, expected);
    }

    #[test]
    fn set_to_generating_reuses_known_and_pooled_chunks() {
        let mut manager = manager(1, 1);
        let first = manager.set_chunk_to_generating(Point3::new(4, 0, 4));
        assert_eq!(manager.set_chunk_to_generating(Point3::new(4, 0, 4)), first);
        assert!(manager.is_generating(Point3::new(4, 0, 4)));
        assert_eq!(manager.stats().allocated, 1);

        // No center yet: completion activates.
        assert!(manager.complete_generating_chunk(Point3::new(4, 0, 4)));
        assert!(manager.is_active(Point3::new(4, 0, 4)));
        assert!(!manager.complete_generating_chunk(Point3::new(4, 0, 4)));
    }

    #[test]
    fn completion_outside_the_window_goes_to_the_clear_queue() {
        let mut manager = manager(1, 1);
        manager.update_chunks(Point3::new(0, 0, 0));
        manager.set_chunk_to_generating(Point3::new(5, 0, 5));
        assert!(manager.complete_generating_chunk(Point3::new(5, 0, 5)));
        assert!(manager.get_chunk(Point3::new(5, 0, 5)).is_none());
        assert_eq!(manager.stats().pending_clear, 1);
    }

    #[test]
    fn edits_regenerate_the_chunk_and_its_neighbor() {
        let mut manager = manager(1, 1);
        manager.update_chunks(Point3::new(0, 0, 0));
        drain(&mut manager);

        let center = Point3::new(0, 0, 0);
        let right = Point3::new(1, 0, 0);
        let before = manager.get_chunk(center).unwrap().mesh().cloned();

        let top = CHUNK_HEIGHT as i32 - 1;
        manager
            .edit_voxel(center, CHUNK_WIDTH as i32 - 1, top, 3, Voxel::new(VoxelType::STONE))
            .unwrap();
        assert_eq!(manager.stats().pending_priority, 2);

        let neighbor = manager.get_chunk(right).unwrap();
        assert!(neighbor.is_modified());
        let mirrored = neighbor.data().unwrap().get_voxel(0, top as usize, 4);
        assert_eq!(mirrored.get_voxel_type(), VoxelType::STONE);

        drain(&mut manager);
        let chunk = manager.get_chunk(center).unwrap();
        assert!(chunk.is_modified());
        assert_ne!(chunk.mesh().cloned(), before);
        assert_eq!(chunk.mesh().unwrap().max_height(), CHUNK_HEIGHT as u32);
    }

    #[test]
    fn edit_errors_are_reported() {
        let mut manager = manager(1, 1);
        assert!(matches!(
            manager.edit_voxel(Point3::new(0, 0, 0), 16, 0, 0, Voxel::AIR),
            Err(EngineError::VoxelOutOfBounds(16, 0, 0))
        ));
        assert!(matches!(
            manager.edit_voxel(Point3::new(0, 0, 0), 0, 0, 0, Voxel::AIR),
            Err(EngineError::ChunkNotFound(_))
        ));
        manager.set_chunk_to_generating(Point3::new(0, 0, 0));
        assert!(matches!(
            manager.edit_voxel(Point3::new(0, 0, 0), 0, 0, 0, Voxel::AIR),
            Err(EngineError::ChunkNotReady(_))
        ));
    }

    #[test]
    fn edited_chunks_survive_eviction_through_the_store() {
        let mut manager = manager(0, 1);
        manager.update_chunks(Point3::new(0, 0, 0));
        drain(&mut manager);
        manager
            .edit_voxel(Point3::new(0, 0, 0), 5, 127, 5, Voxel::new(VoxelType::SNOW))
            .unwrap();
        drain(&mut manager);

        manager.update_chunks(Point3::new(10, 0, 0));
        drain(&mut manager);
        assert_eq!(manager.stats().stored, 1);

        manager.update_chunks(Point3::new(0, 0, 0));
        drain(&mut manager);
        let chunk = manager.get_chunk(Point3::new(0, 0, 0)).unwrap();
        assert_eq!(
            chunk.data().unwrap().get_voxel(6, 127, 6).get_voxel_type(),
            VoxelType::SNOW
        );
        assert!(chunk.is_modified());
        assert_eq!(manager.stats().stored, 0);
    }

    #[test]
    fn edits_evicted_and_revisited_before_clearing_are_kept() {
        let mut manager = manager(0, 1);
        let origin = Point3::new(0, 0, 0);
        manager.update_chunks(origin);
        drain(&mut manager);
        manager
            .edit_voxel(origin, 5, 127, 5, Voxel::new(VoxelType::SNOW))
            .unwrap();
        drain(&mut manager);

        // No tick in between, so the evicted instance is still waiting to be cleared.
        manager.update_chunks(Point3::new(10, 0, 0));
        assert_eq!(manager.stats().stored, 1);
        manager.update_chunks(origin);
        drain(&mut manager);

        let chunk = manager.get_chunk(origin).unwrap();
        assert!(chunk.is_modified());
        assert_eq!(
            chunk.data().unwrap().get_voxel(6, 127, 6).get_voxel_type(),
            VoxelType::SNOW
        );
        assert_eq!(manager.stats().stored, 0);
        assert_eq!(manager.stats().pending_clear, 0);
    }

    #[test]
    fn results_for_an_earlier_assignment_are_dropped() {
        let mut manager = manager(1, 1);
        let position = Point3::new(0, 0, 0);
        let earlier = manager.set_chunk_to_generating(position);
        assert!(manager
            .factory
            .start(GenerationData::full(position), earlier, None, 0));

        // The instance is recycled and handed the same coordinate while its job runs.
        let mut chunk = manager.generating.remove(&position).unwrap();
        chunk.clear();
        manager.pool.push(chunk);
        let current = manager.set_chunk_to_generating(position);
        assert_ne!(current, earlier);
        assert_eq!(manager.stats().reused, 1);

        manager.tick(0.016);
        let chunk = manager.get_chunk(position).unwrap();
        assert_eq!(chunk.id(), current);
        assert!(chunk.is_generating());
        assert!(chunk.data().is_none() && chunk.mesh().is_none());
        assert!(manager.is_generating(position));
        assert_eq!(manager.stats().in_flight, 0);
        assert_eq!(
            manager.chunks_mesh_and_collider_size(),
            (GeometrySize::default(), GeometrySize::default())
        );
    }

    #[test]
    fn a_disposed_manager_leaves_no_chunk_generating() {
        let mut manager = manager(1, 1);
        let origin = Point3::new(0, 0, 0);
        manager.update_chunks(origin);
        drain(&mut manager);

        // One regeneration in place is running and three new chunks wait for a start.
        manager
            .edit_voxel(origin, 3, 127, 3, Voxel::new(VoxelType::SNOW))
            .unwrap();
        for request in manager.factory.admit(0.0) {
            manager.start_request(request);
        }
        assert!(manager.get_chunk(origin).unwrap().is_generating());
        manager.update_chunks(Point3::new(1, 0, 0));
        assert_eq!(manager.stats().generating, 3);

        manager.dispose();
        manager.dispose();
        assert_eq!(manager.stats().generating, 0);
        assert_eq!(manager.stats().in_flight, 0);
        assert!(!manager.get_chunk(origin).unwrap().is_generating());

        manager
            .edit_voxel(origin, 4, 127, 4, Voxel::new(VoxelType::SNOW))
            .unwrap();
        manager.tick(0.016);
        assert_eq!(manager.stats().pending_priority, 0);
        assert!(!manager.get_chunk(origin).unwrap().is_generating());
        drain(&mut manager);
    }

    #[test]
    fn shrinking_the_window_evicts_and_trims() {
        let mut manager = manager(2, 1);
        manager.update_chunks(Point3::new(0, 0, 0));
        drain(&mut manager);
        assert_eq!(manager.stats().active, 25);

        let mut settings = manager.settings().clone();
        settings.render_distance = 1;
        manager.apply_settings(settings);
        drain(&mut manager);
        let stats = manager.stats();
        assert_eq!(stats.active, 9);
        assert_eq!(stats.cached, 0);
        assert!(stats.pooled <= manager.settings().pool_capacity());
    }
}
