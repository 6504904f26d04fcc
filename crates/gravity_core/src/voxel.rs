//! Static voxel terrain that gravity blocks collide against.
//!
//! A `VoxelChunk` stores a CHUNK_SIZE³ dense array of optional voxels and a
//! `VoxelWorld` stores chunks in a HashMap so terrain can extend in every
//! direction, including negative coordinates.
//!
//! ## Coordinate Systems
//!
//! - **World Position** (`IVec3`): Global voxel coordinates, can be negative
//! - **Chunk Position** (`ChunkPos`): Which chunk contains the voxel (world / CHUNK_SIZE)
//! - **Local Position** (`usize, usize, usize`): Position within chunk (0 to CHUNK_SIZE-1)
//!
//! The voxel at world coordinate `(x, y, z)` occupies the unit cube
//! `[x, x+1) x [y, y+1) x [z, z+1)`.

use bevy::math::IVec3;
use std::collections::HashMap;

/// Size of a voxel chunk in each dimension.
pub const CHUNK_SIZE: usize = 32;

/// Signed chunk size for coordinate math.
pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;

/// Answers whether the voxel at an integer coordinate blocks movement.
///
/// This is the only view of the world the physics core needs. Implementors
/// are read-only from the simulation's point of view.
pub trait SolidityQuery {
    fn is_solid(&self, voxel: IVec3) -> bool;
}

/// A single terrain voxel.
///
/// Non-solid voxels (foliage, decoration) are stored so the world stays a
/// faithful copy of the terrain, but they never stop a moving body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voxel {
    /// RGB color components (0-255 each)
    pub color: [u8; 3],
    /// Whether bodies collide with this voxel
    pub solid: bool,
}

impl Voxel {
    /// Create a solid voxel with the given color.
    pub fn solid(r: u8, g: u8, b: u8) -> Self {
        Self {
            color: [r, g, b],
            solid: true,
        }
    }

    /// Create a voxel that bodies pass through.
    pub fn passable(r: u8, g: u8, b: u8) -> Self {
        Self {
            color: [r, g, b],
            solid: false,
        }
    }
}

/// A 32³ chunk of voxels.
#[derive(Debug, Clone)]
pub struct VoxelChunk {
    /// Dense storage: index = x + y * CHUNK_SIZE + z * CHUNK_SIZE²
    voxels: Box<[Option<Voxel>; CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE]>,
}

impl Default for VoxelChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelChunk {
    /// Create an empty chunk (all cells are None).
    pub fn new() -> Self {
        Self {
            voxels: Box::new([None; CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE]),
        }
    }

    fn index(x: usize, y: usize, z: usize) -> Option<usize> {
        if x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE {
            Some(x + y * CHUNK_SIZE + z * CHUNK_SIZE * CHUNK_SIZE)
        } else {
            None
        }
    }

    /// Get the voxel at (x, y, z), or None if empty or out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<Voxel> {
        Self::index(x, y, z).and_then(|i| self.voxels[i])
    }

    /// Set a voxel at (x, y, z). Returns false if out of bounds.
    pub fn set(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) -> bool {
        if let Some(i) = Self::index(x, y, z) {
            self.voxels[i] = Some(voxel);
            true
        } else {
            false
        }
    }

    /// Clear a voxel at (x, y, z). Returns false if out of bounds.
    pub fn clear(&mut self, x: usize, y: usize, z: usize) -> bool {
        if let Some(i) = Self::index(x, y, z) {
            self.voxels[i] = None;
            true
        } else {
            false
        }
    }

    /// Iterate over all filled voxels with their local coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, Voxel)> + '_ {
        self.voxels.iter().enumerate().filter_map(|(i, v)| {
            v.map(|voxel| {
                let x = i % CHUNK_SIZE;
                let y = (i / CHUNK_SIZE) % CHUNK_SIZE;
                let z = i / (CHUNK_SIZE * CHUNK_SIZE);
                (x, y, z, voxel)
            })
        })
    }

    /// Number of filled voxels.
    pub fn count(&self) -> usize {
        self.voxels.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.iter().all(|v| v.is_none())
    }
}

/// Position of a chunk in chunk-space coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing the given world voxel coordinate.
    pub fn from_world(world_x: i32, world_y: i32, world_z: i32) -> Self {
        Self {
            x: world_x.div_euclid(CHUNK_SIZE_I32),
            y: world_y.div_euclid(CHUNK_SIZE_I32),
            z: world_z.div_euclid(CHUNK_SIZE_I32),
        }
    }
}

/// Convert world coordinates to local chunk coordinates.
pub fn world_to_local(world_x: i32, world_y: i32, world_z: i32) -> (usize, usize, usize) {
    (
        world_x.rem_euclid(CHUNK_SIZE_I32) as usize,
        world_y.rem_euclid(CHUNK_SIZE_I32) as usize,
        world_z.rem_euclid(CHUNK_SIZE_I32) as usize,
    )
}

/// Sparse voxel terrain made of chunks.
///
/// ```ignore
/// let mut world = VoxelWorld::new();
/// world.set_voxel(0, 0, 0, Voxel::solid(90, 90, 90));
/// assert!(world.is_solid_at(0, 0, 0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VoxelWorld {
    chunks: HashMap<ChunkPos, VoxelChunk>,
}

impl VoxelWorld {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
        }
    }

    /// Get or create chunk at position.
    pub fn get_or_create_chunk(&mut self, pos: ChunkPos) -> &mut VoxelChunk {
        self.chunks.entry(pos).or_default()
    }

    /// Number of chunks in the world.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Iterate over all chunks with their positions.
    pub fn iter_chunks(&self) -> impl Iterator<Item = (ChunkPos, &VoxelChunk)> {
        self.chunks.iter().map(|(pos, chunk)| (*pos, chunk))
    }

    /// Set a voxel at world coordinates, creating the chunk if needed.
    pub fn set_voxel(&mut self, world_x: i32, world_y: i32, world_z: i32, voxel: Voxel) {
        let chunk_pos = ChunkPos::from_world(world_x, world_y, world_z);
        let (local_x, local_y, local_z) = world_to_local(world_x, world_y, world_z);

        let chunk = self.get_or_create_chunk(chunk_pos);
        chunk.set(local_x, local_y, local_z, voxel);
    }

    /// Get a voxel at world coordinates.
    ///
    /// Returns None if the chunk doesn't exist or the voxel is empty.
    pub fn get_voxel(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<Voxel> {
        let chunk_pos = ChunkPos::from_world(world_x, world_y, world_z);
        let (local_x, local_y, local_z) = world_to_local(world_x, world_y, world_z);

        self.chunks
            .get(&chunk_pos)
            .and_then(|chunk| chunk.get(local_x, local_y, local_z))
    }

    /// Clear a voxel at world coordinates. Does nothing if the chunk doesn't exist.
    pub fn clear_voxel(&mut self, world_x: i32, world_y: i32, world_z: i32) {
        let chunk_pos = ChunkPos::from_world(world_x, world_y, world_z);
        let (local_x, local_y, local_z) = world_to_local(world_x, world_y, world_z);

        if let Some(chunk) = self.chunks.get_mut(&chunk_pos) {
            chunk.clear(local_x, local_y, local_z);
        }
    }

    /// Fill every voxel in the inclusive box `min..=max`.
    pub fn fill_box(&mut self, min: IVec3, max: IVec3, voxel: Voxel) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set_voxel(x, y, z, voxel);
                }
            }
        }
    }

    /// Whether a voxel exists at world coordinates and blocks movement.
    pub fn is_solid_at(&self, world_x: i32, world_y: i32, world_z: i32) -> bool {
        self.get_voxel(world_x, world_y, world_z)
            .is_some_and(|voxel| voxel.solid)
    }

    /// Total count of voxels across all chunks, solid or not.
    pub fn total_voxel_count(&self) -> usize {
        self.chunks.values().map(|c| c.count()).sum()
    }
}

impl SolidityQuery for VoxelWorld {
    fn is_solid(&self, voxel: IVec3) -> bool {
        self.is_solid_at(voxel.x, voxel.y, voxel.z)
    }
}
