//! # Voxel Task System
//!
//! This module contains the chunk generation pipeline: the per-chunk job that runs the
//! data, collider and mesh stages on the worker pool, and the factory that queues,
//! throttles and polls those jobs on behalf of the chunks manager.

pub mod chunk_factory;
pub mod chunk_generation_job;

pub use chunk_factory::{ChunkFactory, JobOutcome};
pub use chunk_generation_job::{ChunkGenerationJob, GeneratedChunk, JobContext, JobState};
