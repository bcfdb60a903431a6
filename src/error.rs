//! # Engine Errors
//!
//! Every fallible operation of the terrain core reports an [`EngineError`]. Failures are
//! contained at chunk granularity: the worst visible effect of any of them is a missing
//! or stale chunk at one coordinate.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

use crate::engine_state::voxels::chunk::ChunkPosition;

/// The generation stage a failure was reported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    /// Terrain data (voxels + heightmaps)
    Data,
    /// Collision geometry
    Collider,
    /// Render geometry
    Mesh,
}

impl Display for GenerationStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStage::Data => write!(f, "data"),
            GenerationStage::Collider => write!(f, "collider"),
            GenerationStage::Mesh => write!(f, "mesh"),
        }
    }
}

/// Errors raised by configuration loading, chunk access and the generation pipeline.
#[derive(Debug)]
pub enum EngineError {
    /// The settings file could not be read.
    SettingsIo(std::io::Error),
    /// The settings file is not valid JSON for [`crate::EngineConfig`].
    SettingsParse(serde_json::Error),
    /// A settings value is outside the range the core accepts.
    InvalidSettings(String),
    /// No chunk is resident at the coordinate.
    ChunkNotFound(ChunkPosition),
    /// The chunk exists but holds no voxel data yet.
    ChunkNotReady(ChunkPosition),
    /// A chunk-local voxel coordinate is outside the chunk.
    VoxelOutOfBounds(i32, i32, i32),
    /// The job was cancelled before it finished.
    GenerationCancelled(ChunkPosition),
    /// A generation stage died before producing its output.
    GenerationFailed(ChunkPosition, GenerationStage),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::SettingsIo(e) => write!(f, "Could not read settings: {}", e),
            EngineError::SettingsParse(e) => write!(f, "Could not parse settings: {}", e),
            EngineError::InvalidSettings(v) => write!(f, "Invalid settings: {}", v),
            EngineError::ChunkNotFound(p) => write!(f, "No chunk at ({}, {})", p.x, p.z),
            EngineError::ChunkNotReady(p) => {
                write!(f, "Chunk at ({}, {}) has no voxel data", p.x, p.z)
            }
            EngineError::VoxelOutOfBounds(x, y, z) => {
                write!(f, "Voxel ({}, {}, {}) is outside the chunk", x, y, z)
            }
            EngineError::GenerationCancelled(p) => {
                write!(f, "Generation of chunk ({}, {}) was cancelled", p.x, p.z)
            }
            EngineError::GenerationFailed(p, stage) => write!(
                f,
                "The {} stage of chunk ({}, {}) failed",
                stage, p.x, p.z
            ),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineError::SettingsIo(e) => Some(e),
            EngineError::SettingsParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::SettingsIo(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::SettingsParse(e)
    }
}
