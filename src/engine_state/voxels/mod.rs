//! # Voxel Terrain Core
//!
//! Everything that represents terrain and keeps it streamed around a viewpoint.
//!
//! ## Architecture
//!
//! * **Block**: Packed voxel words and their material/physics types
//! * **Height map**: Packed per-column solid and liquid ranges
//! * **Chunk**: Fixed-size columns of voxels with a one-voxel border copied from neighbors
//! * **Generation**: Noise-driven terrain synthesis and the stage flags of a request
//! * **Tasks**: The per-chunk job pipeline and the throttling factory in front of it
//! * **Chunks manager**: The active/cached/generating/pooled state machine
//! * **Distance filter**: Nearest-first offsets of the render window
//! * **Storage**: Where edited chunks go when they are evicted
//!
//! ## Data Flow
//!
//! 1. The chunks manager computes the window around the viewpoint and submits requests
//! 2. The factory admits them under its throttle and starts generation jobs
//! 3. Jobs run terrain, collider and mesh stages on the worker pool
//! 4. Finished buffers are handed to their chunk on the control thread

pub mod block;
pub mod chunk;
pub mod chunks_manager;
pub mod distance_filter;
pub mod generation;
pub mod height_map;
pub mod storage;
pub mod tasks;

pub use chunks_manager::{ChunksManager, ChunksManagerStats};
