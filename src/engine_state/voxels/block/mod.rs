//! # Block Module
//!
//! This module provides the packed voxel value the whole pipeline stores, together with
//! the block type, physics class and face definitions it is built from.

use block_type::{PhysicsType, VoxelType};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

const VOXEL_TYPE_MASK: u16 = 0x00FF;
const PHYSICS_TYPE_SHIFT: u16 = 8;
const PHYSICS_TYPE_MASK: u16 = 0xFF00;

/// A single voxel packed into 16 bits.
///
/// # Memory Layout
/// - Low byte: block type identifier ([`VoxelType`] discriminant, 0 = air)
/// - High byte: physics classification ([`PhysicsType`] discriminant)
///
/// The `#[repr(transparent)]` attribute keeps the layout identical to a `u16`, so voxel
/// buffers can be handed to the rendering side as raw bytes.
///
/// # Examples
/// ```
/// use voxel_terrain::engine_state::voxels::block::{
///     block_type::{PhysicsType, VoxelType},
///     Voxel,
/// };
///
/// let mut voxel = Voxel::default();
/// voxel.set_voxel_type(VoxelType::STONE);
/// voxel.set_physics_type(PhysicsType::SOLID);
///
/// assert_eq!(voxel.get_voxel_type(), VoxelType::STONE);
/// assert_eq!(voxel.get_physics_type(), PhysicsType::SOLID);
/// assert!(!voxel.is_empty());
/// ```
#[repr(transparent)]
#[derive(
    Copy, Clone, Default, PartialEq, Eq, Hash, Debug, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct Voxel(u16);

impl Voxel {
    /// The empty voxel.
    pub const AIR: Voxel = Voxel(0);

    /// Creates a voxel of the given type with the type's default physics class.
    pub fn new(voxel_type: VoxelType) -> Self {
        let mut voxel = Voxel::AIR;
        voxel.set_voxel_type(voxel_type);
        voxel.set_physics_type(voxel_type.default_physics());
        voxel
    }

    /// Rebuilds a voxel from its raw 16-bit representation.
    pub const fn from_bits(bits: u16) -> Self {
        Voxel(bits)
    }

    /// Returns the raw 16-bit representation.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Writes the low byte, leaving the physics byte untouched.
    pub fn set_voxel_type(&mut self, voxel_type: VoxelType) {
        self.set_voxel_type_id(voxel_type as BlockTypeSize);
    }

    /// Writes a raw identifier into the low byte.
    pub fn set_voxel_type_id(&mut self, id: BlockTypeSize) {
        self.0 = (self.0 & PHYSICS_TYPE_MASK) | id as u16;
    }

    /// Writes the high byte, leaving the type byte untouched.
    pub fn set_physics_type(&mut self, physics_type: PhysicsType) {
        self.0 = (self.0 & VOXEL_TYPE_MASK) | ((physics_type as u16) << PHYSICS_TYPE_SHIFT);
    }

    /// Reads the low byte as a [`VoxelType`]. Unknown identifiers read as `AIR`.
    pub fn get_voxel_type(self) -> VoxelType {
        VoxelType::from_id(self.voxel_type_id()).unwrap_or(VoxelType::AIR)
    }

    /// Reads the raw identifier in the low byte.
    pub fn voxel_type_id(self) -> BlockTypeSize {
        (self.0 & VOXEL_TYPE_MASK) as BlockTypeSize
    }

    /// Reads the high byte as a [`PhysicsType`]. Unknown identifiers read as `NONE`.
    pub fn get_physics_type(self) -> PhysicsType {
        PhysicsType::from_id((self.0 >> PHYSICS_TYPE_SHIFT) as u8).unwrap_or(PhysicsType::NONE)
    }

    /// `true` iff the low byte is 0.
    pub fn is_empty(self) -> bool {
        self.voxel_type_id() == 0
    }

    /// `true` if the physics class is `SOLID`.
    pub fn is_solid(self) -> bool {
        self.get_physics_type() == PhysicsType::SOLID
    }

    /// `true` if the physics class is `LIQUID`.
    pub fn is_liquid(self) -> bool {
        self.get_physics_type() == PhysicsType::LIQUID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [VoxelType; 8] = [
        VoxelType::AIR,
        VoxelType::BEDROCK,
        VoxelType::STONE,
        VoxelType::DIRT,
        VoxelType::GRASS,
        VoxelType::SAND,
        VoxelType::SNOW,
        VoxelType::WATER,
    ];
    const ALL_PHYSICS: [PhysicsType; 3] =
        [PhysicsType::NONE, PhysicsType::SOLID, PhysicsType::LIQUID];

    #[test]
    fn every_type_and_physics_pair_round_trips() {
        for voxel_type in ALL_TYPES {
            for physics_type in ALL_PHYSICS {
                let mut voxel = Voxel::default();
                voxel.set_voxel_type(voxel_type);
                voxel.set_physics_type(physics_type);
                assert_eq!(voxel.get_voxel_type(), voxel_type);
                assert_eq!(voxel.get_physics_type(), physics_type);

                // Write order must not matter.
                let mut reversed = Voxel::default();
                reversed.set_physics_type(physics_type);
                reversed.set_voxel_type(voxel_type);
                assert_eq!(voxel, reversed);
            }
        }
    }

    #[test]
    fn setting_one_byte_never_perturbs_the_other() {
        for first in ALL_TYPES {
            for physics_type in ALL_PHYSICS {
                for second in ALL_TYPES {
                    let mut voxel = Voxel::default();
                    voxel.set_voxel_type(first);
                    voxel.set_physics_type(physics_type);
                    voxel.set_voxel_type(second);
                    assert_eq!(voxel.get_physics_type(), physics_type);
                    assert_eq!(voxel.get_voxel_type(), second);
                }
            }
        }
    }

    #[test]
    fn emptiness_only_looks_at_the_low_byte() {
        let mut voxel = Voxel::default();
        voxel.set_physics_type(PhysicsType::SOLID);
        assert!(voxel.is_empty());
        voxel.set_voxel_type(VoxelType::DIRT);
        assert!(!voxel.is_empty());
    }

    #[test]
    fn unknown_raw_identifiers_are_kept_but_read_as_air() {
        let mut voxel = Voxel::default();
        voxel.set_voxel_type_id(200);
        assert_eq!(voxel.voxel_type_id(), 200);
        assert_eq!(voxel.get_voxel_type(), VoxelType::AIR);
        assert!(!voxel.is_empty());
    }

    #[test]
    fn new_assigns_default_physics() {
        assert!(Voxel::new(VoxelType::STONE).is_solid());
        assert!(Voxel::new(VoxelType::WATER).is_liquid());
        assert!(Voxel::new(VoxelType::AIR).is_empty());
    }
}
