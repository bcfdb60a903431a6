//! # Block Side Module
//!
//! This module defines the six faces of a voxel, the fixed normal and UV tables the
//! packed mesh format indexes into, and the corner layout of each face.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The discriminant is the face index written into the packed vertex word and indexes
/// [`FACE_NORMALS`].
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
#[allow(clippy::upper_case_acronyms)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

/// Unit normals indexed by [`BlockSide`] discriminant.
pub const FACE_NORMALS: [[f32; 3]; 6] = [
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
    [0.0, -1.0, 0.0],
    [0.0, 1.0, 0.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
];

/// Texture coordinates indexed by the UV-corner bits of a packed vertex.
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Corner offsets of each face relative to the voxel's minimum corner, listed
/// counter-clockwise as seen from outside the voxel. Corner `n` uses UV entry `n`.
const FACE_CORNERS: [[[i32; 3]; 4]; 6] = [
    // FRONT (+Z)
    [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]],
    // BACK (-Z)
    [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
    // BOTTOM (-Y)
    [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
    // TOP (+Y)
    [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]],
    // LEFT (-X)
    [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]],
    // RIGHT (+X)
    [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
];

/// Index pattern turning the four corners of a face into two triangles.
pub const FACE_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
    pub const fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// The four faces a column can expose towards its horizontal neighbors.
    pub const fn horizontal() -> [BlockSide; 4] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Looks a face up by its packed index.
    pub fn from_index(index: u32) -> Option<BlockSide> {
        BlockSide::all().get(index as usize).copied()
    }

    /// The grid step from a voxel to its neighbor across this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// Corner offsets of this face, counter-clockwise from outside.
    pub fn corners(self) -> &'static [[i32; 3]; 4] {
        &FACE_CORNERS[self as usize]
    }

    /// The unit normal of this face.
    pub fn normal(self) -> [f32; 3] {
        FACE_NORMALS[self as usize]
    }
}
