//! # Block Type Module
//!
//! This module defines the block identities and physics classes stored in the two
//! bytes of a packed [`Voxel`](super::Voxel).

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all block identities in the terrain.
///
/// The discriminant is the value stored in the low byte of a voxel. `AIR` must stay 0:
/// a voxel is empty exactly when its low byte is 0.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize, Default,
)]
#[allow(clippy::upper_case_acronyms)]
pub enum VoxelType {
    /// Empty space.
    #[default]
    AIR = 0,
    /// The indestructible floor at `y = 0`.
    BEDROCK,
    /// Deep terrain.
    STONE,
    /// Soil under the surface voxel.
    DIRT,
    /// Surface of lowland columns.
    GRASS,
    /// Surface and soil of beach columns.
    SAND,
    /// Surface of mountain columns.
    SNOW,
    /// Fills submerged columns up to sea level.
    WATER,
}

impl VoxelType {
    /// Converts a raw identifier to a `VoxelType`.
    ///
    /// # Returns
    /// `None` if `id` does not name a known type.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// The physics class terrain generation assigns to this type.
    pub fn default_physics(self) -> PhysicsType {
        match self {
            VoxelType::AIR => PhysicsType::NONE,
            VoxelType::WATER => PhysicsType::LIQUID,
            _ => PhysicsType::SOLID,
        }
    }
}

/// Physics classification stored in the high byte of a voxel.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize, Default,
)]
#[allow(clippy::upper_case_acronyms)]
pub enum PhysicsType {
    /// Not collidable (air).
    #[default]
    NONE = 0,
    /// Collidable terrain.
    SOLID,
    /// Swimmable volume.
    LIQUID,
}

impl PhysicsType {
    /// Converts a raw identifier to a `PhysicsType`.
    pub fn from_id(id: u8) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }
}
