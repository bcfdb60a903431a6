//! # Chunk Storage
//!
//! Persistence hook for edited chunks. When an edited chunk is cleared its voxel data
//! is handed to a [`ChunkStore`]; when the coordinate is requested again the stored data
//! is reused and terrain generation is skipped.
//!
//! Only an in-memory implementation is provided. It keeps a bounded number of chunks
//! and forgets the least recently saved ones first.

use std::num::NonZeroUsize;

use log::debug;
use lru::LruCache;

use crate::engine_state::voxels::chunk::{ChunkData, ChunkPosition};

/// Where edited chunk data goes when its chunk is cleared.
pub trait ChunkStore: Send {
    /// Keeps `data` for `position`, replacing anything stored before.
    fn save(&mut self, position: ChunkPosition, data: ChunkData);

    /// Takes the data stored for `position`, if any.
    fn load(&mut self, position: ChunkPosition) -> Option<ChunkData>;

    /// Whether data is stored for `position`.
    fn contains(&self, position: ChunkPosition) -> bool;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// LRU-bounded in-memory [`ChunkStore`]. A capacity of zero stores nothing.
#[derive(Debug)]
pub struct MemoryChunkStore {
    chunks: Option<LruCache<ChunkPosition, ChunkData>>,
}

impl MemoryChunkStore {
    pub fn new(capacity: usize) -> Self {
        MemoryChunkStore {
            chunks: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }
}

impl ChunkStore for MemoryChunkStore {
    fn save(&mut self, position: ChunkPosition, data: ChunkData) {
        let Some(chunks) = self.chunks.as_mut() else {
            return;
        };
        if let Some((forgotten, _)) = chunks.push(position, data) {
            if forgotten != position {
                debug!("Chunk store full, forgot edits of chunk {:?}", forgotten);
            }
        }
    }

    fn load(&mut self, position: ChunkPosition) -> Option<ChunkData> {
        self.chunks.as_mut()?.pop(&position)
    }

    fn contains(&self, position: ChunkPosition) -> bool {
        self.chunks
            .as_ref()
            .is_some_and(|chunks| chunks.contains(&position))
    }

    fn len(&self) -> usize {
        self.chunks.as_ref().map_or(0, LruCache::len)
    }
}
