//! Bit-packed solidity cache for terrain collision queries.
//!
//! Body ticks ask the terrain the same question thousands of times per
//! second ("is this voxel solid?"). `WorldOccupancy` answers it with one
//! HashMap lookup and a bit test instead of walking full voxel data:
//!
//! ```text
//! VoxelWorld (colors, passable decoration)
//!       │
//!       ▼
//! ChunkOccupancy (32x32x32 bits = 4KB per chunk, solid voxels only)
//!       │
//!       ▼
//! WorldOccupancy (HashMap of chunks, implements SolidityQuery)
//! ```

use bevy::math::{IVec3, UVec3};
use std::collections::HashMap;

use crate::voxel::{SolidityQuery, VoxelChunk, VoxelWorld, CHUNK_SIZE};

/// Size of a chunk in one dimension (must match voxel.rs).
pub const OCCUPANCY_CHUNK_SIZE: usize = CHUNK_SIZE;

/// 32 * 32 * 32 = 32768 bits = 1024 u32s
const CHUNK_U32_COUNT: usize =
    (OCCUPANCY_CHUNK_SIZE * OCCUPANCY_CHUNK_SIZE * OCCUPANCY_CHUNK_SIZE) / 32;

/// Bit-packed solidity for a single 32x32x32 chunk.
#[derive(Clone)]
pub struct ChunkOccupancy {
    /// Index formula: (x + y * 32 + z * 32 * 32) / 32 for u32 index,
    /// remainder is the bit position.
    data: [u32; CHUNK_U32_COUNT],
}

impl Default for ChunkOccupancy {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkOccupancy {
    pub fn new() -> Self {
        Self {
            data: [0; CHUNK_U32_COUNT],
        }
    }

    /// Build from a chunk, keeping only voxels that block movement.
    pub fn from_chunk(chunk: &VoxelChunk) -> Self {
        let mut occ = Self::new();
        for (x, y, z, voxel) in chunk.iter() {
            if voxel.solid {
                occ.set(UVec3::new(x as u32, y as u32, z as u32), true);
            }
        }
        occ
    }

    #[inline]
    fn index_to_bit(local_pos: UVec3) -> (usize, u32) {
        let linear = local_pos.x + local_pos.y * 32 + local_pos.z * 32 * 32;
        ((linear / 32) as usize, linear % 32)
    }

    /// Get occupancy at local position (0-31 in each dimension).
    #[inline]
    pub fn get(&self, local_pos: UVec3) -> bool {
        debug_assert!(local_pos.x < 32 && local_pos.y < 32 && local_pos.z < 32);
        let (idx, bit) = Self::index_to_bit(local_pos);
        (self.data[idx] & (1 << bit)) != 0
    }

    /// Set occupancy at local position.
    #[inline]
    pub fn set(&mut self, local_pos: UVec3, occupied: bool) {
        debug_assert!(local_pos.x < 32 && local_pos.y < 32 && local_pos.z < 32);
        let (idx, bit) = Self::index_to_bit(local_pos);
        if occupied {
            self.data[idx] |= 1 << bit;
        } else {
            self.data[idx] &= !(1 << bit);
        }
    }

    pub fn count_occupied(&self) -> usize {
        self.data.iter().map(|&x| x.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&x| x == 0)
    }
}

/// World-level solidity cache.
#[derive(Clone, Default)]
pub struct WorldOccupancy {
    chunks: HashMap<IVec3, ChunkOccupancy>,
}

impl WorldOccupancy {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
        }
    }

    /// Snapshot the solid voxels of a VoxelWorld. Chunks with no solid
    /// voxels are skipped.
    pub fn from_voxel_world(world: &VoxelWorld) -> Self {
        let mut occ = Self::new();
        for (chunk_pos, chunk) in world.iter_chunks() {
            let chunk_occ = ChunkOccupancy::from_chunk(chunk);
            if !chunk_occ.is_empty() {
                let coord = IVec3::new(chunk_pos.x, chunk_pos.y, chunk_pos.z);
                occ.chunks.insert(coord, chunk_occ);
            }
        }
        occ
    }

    /// Mark a single world voxel solid or empty, creating the chunk on demand.
    pub fn set_voxel(&mut self, world_pos: IVec3, solid: bool) {
        let chunk = self
            .chunks
            .entry(world_pos_to_chunk_coord(world_pos))
            .or_default();
        chunk.set(world_pos_to_local(world_pos), solid);
    }

    /// Check if a world position is solid. Unloaded chunks are empty.
    pub fn get_voxel(&self, world_pos: IVec3) -> bool {
        let chunk_coord = world_pos_to_chunk_coord(world_pos);
        let local_pos = world_pos_to_local(world_pos);

        self.chunks
            .get(&chunk_coord)
            .map(|chunk| chunk.get(local_pos))
            .unwrap_or(false)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_occupied(&self) -> usize {
        self.chunks.values().map(|c| c.count_occupied()).sum()
    }
}

impl SolidityQuery for WorldOccupancy {
    fn is_solid(&self, voxel: IVec3) -> bool {
        self.get_voxel(voxel)
    }
}

/// Convert world position to chunk coordinate.
#[inline]
pub fn world_pos_to_chunk_coord(world_pos: IVec3) -> IVec3 {
    IVec3::new(
        world_pos.x.div_euclid(OCCUPANCY_CHUNK_SIZE as i32),
        world_pos.y.div_euclid(OCCUPANCY_CHUNK_SIZE as i32),
        world_pos.z.div_euclid(OCCUPANCY_CHUNK_SIZE as i32),
    )
}

/// Convert world position to local chunk position (0-31).
#[inline]
pub fn world_pos_to_local(world_pos: IVec3) -> UVec3 {
    UVec3::new(
        world_pos.x.rem_euclid(OCCUPANCY_CHUNK_SIZE as i32) as u32,
        world_pos.y.rem_euclid(OCCUPANCY_CHUNK_SIZE as i32) as u32,
        world_pos.z.rem_euclid(OCCUPANCY_CHUNK_SIZE as i32) as u32,
    )
}
