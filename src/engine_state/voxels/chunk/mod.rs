//! # Chunk Module
//!
//! This module provides the `Chunk` struct: one reusable slot of the streaming window
//! holding a chunk's voxel data, its render mesh and its collision mesh.
//!
//! ## Lifecycle
//!
//! Chunk instances are recycled rather than reallocated. The chunks manager moves an
//! instance between its pool (no coordinate), the generating set, the active set and the
//! cached set. A chunk never knows which set holds it; it only tracks the flags the
//! manager and the renderer need (`visible`, `generating`, `modified`).
//!
//! ## Dimensions
//!
//! A chunk is a `CHUNK_WIDTH × CHUNK_HEIGHT × CHUNK_WIDTH` column of voxels. Terrain is
//! column based, so chunk coordinates only vary in X and Z.

use cgmath::Point3;

use crate::engine_state::rendering::meshing::{ColliderData, GeometrySize, MeshData};

pub mod chunk_data;

pub use chunk_data::ChunkData;

/// Horizontal size of a chunk in voxels.
pub const CHUNK_WIDTH: usize = 16;
/// Vertical size of a chunk in voxels. Heights must fit the heightmap's byte fields.
pub const CHUNK_HEIGHT: usize = 128;
/// Horizontal size including the one voxel border on each side.
pub const CHUNK_WIDTH_WRAPPED: usize = CHUNK_WIDTH + 2;
/// Number of columns (heightmap entries) including the border.
pub const CHUNK_COLUMNS_WRAPPED: usize = CHUNK_WIDTH_WRAPPED * CHUNK_WIDTH_WRAPPED;
/// Number of voxels including the border.
pub const CHUNK_VOXELS_WRAPPED: usize = CHUNK_COLUMNS_WRAPPED * CHUNK_HEIGHT;

/// A chunk coordinate. `y` is always 0.
pub type ChunkPosition = Point3<i32>;

/// Identifies one chunk instance for as long as it lives, across pool reuse.
pub type ChunkId = u64;

/// Returns `position` with its Y component forced to 0.
pub fn normalize_position(position: ChunkPosition) -> ChunkPosition {
    Point3::new(position.x, 0, position.z)
}

/// Chebyshev distance between two chunk coordinates on the X/Z plane.
pub fn chebyshev_distance(a: ChunkPosition, b: ChunkPosition) -> i32 {
    (a.x - b.x).abs().max((a.z - b.z).abs())
}

/// Converts a world-space position to the coordinate of the chunk containing it.
pub fn world_to_chunk_position(world: Point3<f32>) -> ChunkPosition {
    let width = CHUNK_WIDTH as f32;
    Point3::new((world.x / width).floor() as i32, 0, (world.z / width).floor() as i32)
}

/// Geometry sizes before and after a chunk swapped its meshes.
///
/// Returned by [`Chunk::upload`] so the owner can keep its aggregate counts current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometrySwap {
    /// Render mesh size before the upload.
    pub old_mesh: GeometrySize,
    /// Render mesh size after the upload.
    pub new_mesh: GeometrySize,
    /// Collider size before the upload.
    pub old_collider: GeometrySize,
    /// Collider size after the upload.
    pub new_collider: GeometrySize,
}

/// A reusable chunk slot.
#[derive(Debug)]
pub struct Chunk {
    id: ChunkId,
    position: Option<ChunkPosition>,
    data: Option<ChunkData>,
    mesh: Option<MeshData>,
    collider: Option<ColliderData>,
    /// Whether the renderer should draw this chunk's instance.
    visible: bool,
    /// Whether a generation job currently targets this chunk.
    generating: bool,
    /// Whether the voxel data was edited since it was generated.
    modified: bool,
    /// Incremented on every edit; lets partial jobs detect stale snapshots.
    revision: u64,
}

impl Chunk {
    /// Creates an unassigned, empty chunk.
    pub fn new(id: ChunkId) -> Self {
        Chunk {
            id,
            position: None,
            data: None,
            mesh: None,
            collider: None,
            visible: false,
            generating: false,
            modified: false,
            revision: 0,
        }
    }

    /// The id of the chunk's current assignment. Also serves as the renderer's instance
    /// handle. A pooled chunk gets a fresh id each time it is assigned again.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// The coordinate this chunk is assigned to, if any.
    pub fn position(&self) -> Option<ChunkPosition> {
        self.position
    }

    /// Assigns the chunk to a coordinate under a new id. The chunk must be cleared first.
    pub fn assign(&mut self, id: ChunkId, position: ChunkPosition) {
        debug_assert!(self.data.is_none() && self.mesh.is_none());
        self.id = id;
        self.position = Some(normalize_position(position));
    }

    /// The voxel data, once generated.
    pub fn data(&self) -> Option<&ChunkData> {
        self.data.as_ref()
    }

    /// The render mesh, once generated.
    pub fn mesh(&self) -> Option<&MeshData> {
        self.mesh.as_ref()
    }

    /// The collision mesh, once generated.
    pub fn collider(&self) -> Option<&ColliderData> {
        self.collider.as_ref()
    }

    /// Whether the renderer should draw this chunk.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows or hides the chunk's instance.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether a generation job currently targets this chunk.
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Flags or unflags the chunk as targeted by a generation job.
    pub fn set_generating(&mut self, generating: bool) {
        self.generating = generating;
    }

    /// Whether the voxel data was edited since generation.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Flags the data as edited without touching it, for data restored from a store.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// The edit revision of the voxel data.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mutable access to the voxel data for edits. Marks the chunk modified and bumps
    /// its revision.
    pub fn edit_data(&mut self) -> Option<&mut ChunkData> {
        let data = self.data.as_mut()?;
        self.modified = true;
        self.revision += 1;
        Some(data)
    }

    /// Size of the render mesh, zero when there is none.
    pub fn mesh_size(&self) -> GeometrySize {
        self.mesh.as_ref().map(MeshData::size).unwrap_or_default()
    }

    /// Size of the collision mesh, zero when there is none.
    pub fn collider_size(&self) -> GeometrySize {
        self.collider
            .as_ref()
            .map(ColliderData::size)
            .unwrap_or_default()
    }

    /// Takes ownership of freshly generated buffers.
    ///
    /// Each `Some` replaces what the chunk held; each `None` keeps the current buffer.
    pub fn upload(
        &mut self,
        data: Option<ChunkData>,
        mesh: Option<MeshData>,
        collider: Option<ColliderData>,
    ) -> GeometrySwap {
        let old_mesh = self.mesh_size();
        let old_collider = self.collider_size();

        if let Some(data) = data {
            self.data = Some(data);
        }
        if let Some(mesh) = mesh {
            self.mesh = Some(mesh);
        }
        if let Some(collider) = collider {
            self.collider = Some(collider);
        }

        GeometrySwap {
            old_mesh,
            new_mesh: self.mesh_size(),
            old_collider,
            new_collider: self.collider_size(),
        }
    }

    /// Moves the voxel data out if it was edited, so it can be persisted. The chunk is
    /// left unmodified and without data.
    pub fn take_modified_data(&mut self) -> Option<ChunkData> {
        if !self.modified {
            return None;
        }
        self.modified = false;
        self.data.take()
    }

    /// Releases every buffer and unassigns the chunk so it can return to the pool.
    /// Clearing an already cleared chunk does nothing.
    pub fn clear(&mut self) {
        self.data = None;
        self.mesh = None;
        self.collider = None;
        self.position = None;
        self.visible = false;
        self.generating = false;
        self.modified = false;
        self.revision = 0;
    }
}
