//! Vertex data structures for chunk meshes.
//!
//! This module defines the packed vertex format the mesh and collider generators emit and
//! the rendering side consumes directly as raw bytes.

use crate::engine_state::voxels::block::block_side::BlockSide;

const X_SHIFT: u32 = 0;
const Y_SHIFT: u32 = 6;
const Z_SHIFT: u32 = 15;
const FACE_SHIFT: u32 = 21;
const UV_SHIFT: u32 = 24;

const X_MASK: u32 = 0x3F;
const Y_MASK: u32 = 0x1FF;
const Z_MASK: u32 = 0x3F;
const FACE_MASK: u32 = 0x7;
const UV_MASK: u32 = 0x3;

/// Packs a chunk-local corner position, a face index and a UV-corner index into one word.
///
/// # Memory Layout
/// - Bits 0-5: x (0..=63)
/// - Bits 6-14: y (0..=511)
/// - Bits 15-20: z (0..=63)
/// - Bits 21-23: face index into [`FACE_NORMALS`](crate::engine_state::voxels::block::block_side::FACE_NORMALS)
/// - Bits 24-25: UV-corner index into [`FACE_UVS`](crate::engine_state::voxels::block::block_side::FACE_UVS)
/// - Bits 26-31: unused
///
/// Each field is masked to its width.
#[inline]
pub const fn pack_position(x: u32, y: u32, z: u32, face: u32, uv: u32) -> u32 {
    ((x & X_MASK) << X_SHIFT)
        | ((y & Y_MASK) << Y_SHIFT)
        | ((z & Z_MASK) << Z_SHIFT)
        | ((face & FACE_MASK) << FACE_SHIFT)
        | ((uv & UV_MASK) << UV_SHIFT)
}

/// Reads the x field of a packed position word.
#[inline]
pub const fn unpack_x(word: u32) -> u32 {
    (word >> X_SHIFT) & X_MASK
}

/// Reads the y field of a packed position word.
#[inline]
pub const fn unpack_y(word: u32) -> u32 {
    (word >> Y_SHIFT) & Y_MASK
}

/// Reads the z field of a packed position word.
#[inline]
pub const fn unpack_z(word: u32) -> u32 {
    (word >> Z_SHIFT) & Z_MASK
}

/// Reads the face field of a packed position word.
#[inline]
pub const fn unpack_face(word: u32) -> u32 {
    (word >> FACE_SHIFT) & FACE_MASK
}

/// Reads the UV-corner field of a packed position word.
#[inline]
pub const fn unpack_uv(word: u32) -> u32 {
    (word >> UV_SHIFT) & UV_MASK
}

/// A vertex in the voxel rendering pipeline.
///
/// Represents one corner of a voxel face. The vertex shader expands the packed word with
/// the normal and UV tables; the height word feeds height-based shading without another
/// unpack.
///
/// # Memory Layout
/// - Position: packed u32 (4 bytes), see [`pack_position`]
/// - Height: u32 (4 bytes), the corner's linear y
///
/// Total size: 8 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Packed position, face and UV-corner word
    pub position: u32,
    /// Linear height of the vertex
    pub height: u32,
}

impl MeshVertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - The chunk-local corner position
    /// * `side` - The face this corner belongs to
    /// * `uv` - Which of the four UV corners this vertex uses
    ///
    /// # Returns
    /// A new `MeshVertex` whose height word repeats `y`
    pub fn new(x: u32, y: u32, z: u32, side: BlockSide, uv: u32) -> Self {
        MeshVertex {
            position: pack_position(x, y, z, side as u32, uv),
            height: y,
        }
    }

    /// The corner's x coordinate.
    pub fn x(&self) -> u32 {
        unpack_x(self.position)
    }

    /// The corner's y coordinate.
    pub fn y(&self) -> u32 {
        unpack_y(self.position)
    }

    /// The corner's z coordinate.
    pub fn z(&self) -> u32 {
        unpack_z(self.position)
    }

    /// The face this vertex belongs to.
    pub fn side(&self) -> Option<BlockSide> {
        BlockSide::from_index(unpack_face(self.position))
    }

    /// The UV-corner index.
    pub fn uv(&self) -> u32 {
        unpack_uv(self.position)
    }
}
