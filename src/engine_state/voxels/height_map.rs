//! # Height Map Module
//!
//! Per-column compact encoding of solid and liquid extents. Meshing and collider
//! generation read these instead of scanning full voxel columns.

const SOLID_SHIFT: u32 = 0;
const LIQUID_BOTTOM_SHIFT: u32 = 8;
const LIQUID_TOP_SHIFT: u32 = 16;
const BYTE_MASK: u32 = 0xFF;

/// One column's extents packed into 32 bits.
///
/// # Memory Layout
/// - Byte 0: Y of the highest solid voxel
/// - Byte 1: Y of the lowest liquid voxel
/// - Byte 2: Y of the highest liquid voxel
/// - Byte 3: unused
///
/// Setters take a `u32` and keep only its low byte. Out-of-range values are truncated
/// silently; callers are expected to range-check heights before storing them.
#[repr(transparent)]
#[derive(
    Copy, Clone, Default, PartialEq, Eq, Hash, Debug, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct HeightMap(u32);

impl HeightMap {
    /// Rebuilds a heightmap entry from its raw representation.
    pub const fn from_bits(bits: u32) -> Self {
        HeightMap(bits)
    }

    /// Returns the raw representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    fn set_byte(&mut self, shift: u32, value: u32) {
        self.0 = (self.0 & !(BYTE_MASK << shift)) | ((value & BYTE_MASK) << shift);
    }

    fn get_byte(self, shift: u32) -> u32 {
        (self.0 >> shift) & BYTE_MASK
    }

    /// Writes byte 0.
    pub fn set_solid(&mut self, height: u32) {
        self.set_byte(SOLID_SHIFT, height);
    }

    /// Writes byte 1.
    pub fn set_liquid_bottom(&mut self, height: u32) {
        self.set_byte(LIQUID_BOTTOM_SHIFT, height);
    }

    /// Writes byte 2.
    pub fn set_liquid_top(&mut self, height: u32) {
        self.set_byte(LIQUID_TOP_SHIFT, height);
    }

    /// Reads byte 0.
    pub fn get_solid(self) -> u32 {
        self.get_byte(SOLID_SHIFT)
    }

    /// Reads byte 1.
    pub fn get_liquid_bottom(self) -> u32 {
        self.get_byte(LIQUID_BOTTOM_SHIFT)
    }

    /// Reads byte 2.
    pub fn get_liquid_top(self) -> u32 {
        self.get_byte(LIQUID_TOP_SHIFT)
    }

    /// Highest Y holding anything that can produce a face.
    pub fn column_top(self) -> u32 {
        self.get_solid().max(self.get_liquid_top())
    }
}
