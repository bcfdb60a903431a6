//! # Generation Module
//!
//! Request records for the chunk generation pipeline, and the terrain generator that
//! fills chunk data from noise.

use std::fmt::{Debug, Formatter};
use std::ops::{BitOr, BitOrAssign};

use crate::engine_state::voxels::chunk::{normalize_position, ChunkPosition};

pub mod terrain;

pub use terrain::TerrainGenerator;

/// Set of pipeline stages a request asks for.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct GenerationStages(u8);

impl GenerationStages {
    pub const NONE: GenerationStages = GenerationStages(0);
    /// Voxel and heightmap generation.
    pub const DATA: GenerationStages = GenerationStages(1 << 0);
    /// Collision mesh generation.
    pub const COLLIDER: GenerationStages = GenerationStages(1 << 1);
    /// Render mesh generation.
    pub const MESH: GenerationStages = GenerationStages(1 << 2);
    pub const ALL: GenerationStages = GenerationStages(0b111);

    /// `true` if every stage of `other` is part of `self`.
    pub const fn contains(self, other: GenerationStages) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `self` without the stages of `other`.
    pub const fn without(self, other: GenerationStages) -> GenerationStages {
        GenerationStages(self.0 & !other.0)
    }
}

impl BitOr for GenerationStages {
    type Output = GenerationStages;

    fn bitor(self, other: GenerationStages) -> GenerationStages {
        GenerationStages(self.0 | other.0)
    }
}

impl BitOrAssign for GenerationStages {
    fn bitor_assign(&mut self, other: GenerationStages) {
        self.0 |= other.0;
    }
}

impl Debug for GenerationStages {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = [
            (GenerationStages::DATA, "DATA"),
            (GenerationStages::COLLIDER, "COLLIDER"),
            (GenerationStages::MESH, "MESH"),
        ]
        .iter()
        .filter(|(stage, _)| self.contains(*stage))
        .map(|(_, name)| *name)
        .collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

/// A request to (re)generate parts of the chunk at `position`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GenerationData {
    pub position: ChunkPosition,
    pub stages: GenerationStages,
}

impl GenerationData {
    /// Creates a request. The position's y is normalized to 0.
    pub fn new(position: ChunkPosition, stages: GenerationStages) -> Self {
        GenerationData {
            position: normalize_position(position),
            stages,
        }
    }

    /// A request for every stage.
    pub fn full(position: ChunkPosition) -> Self {
        Self::new(position, GenerationStages::ALL)
    }

    /// Whether the request regenerates the voxel data.
    pub fn is_full(&self) -> bool {
        self.stages.contains(GenerationStages::DATA)
    }
}
