//! Stateless collision geometry: body boxes, overlap, ray entry and the
//! voxel solidity sweep.
//!
//! A body's box spans `[position, position + size]` on every axis, with
//! `position` as its minimum corner.

use bevy::math::{IVec3, Vec3};

use crate::voxel::SolidityQuery;

/// Directions with a component smaller than this are treated as parallel to
/// that axis' slabs.
const RAY_PARALLEL_EPSILON: f32 = 1e-6;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube box for a body whose minimum corner sits at `position`.
    pub fn from_body(position: Vec3, size: f32) -> Self {
        Self {
            min: position,
            max: position + Vec3::splat(size),
        }
    }

    /// Strict interval test on all three axes. Boxes that only share a
    /// face do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Distance along `direction` at which a ray from `origin` first meets
    /// this box, or None if it misses or the hit lies beyond `max_distance`.
    ///
    /// Uses the slab method. A ray that starts inside the box hits it at
    /// distance 0. `direction` is expected to be unit length so the result
    /// is a world distance.
    pub fn ray_distance(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < RAY_PARALLEL_EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t1 = (lo - o) * inv;
            let mut t2 = (hi - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }

        let t = t_min.max(0.0);
        (t <= max_distance).then_some(t)
    }
}

/// Whether a body of `size` at `position` touches any solid voxel.
///
/// Every integer coordinate from `floor(min)` to `ceil(max)` inclusive is
/// checked, so a box counts as touching a voxel it reaches at integer
/// granularity even without real volume overlap.
pub fn box_touches_solid<W>(world: &W, position: Vec3, size: f32) -> bool
where
    W: SolidityQuery + ?Sized,
{
    let bounds = Aabb::from_body(position, size);
    let min = bounds.min.floor().as_ivec3();
    let max = bounds.max.ceil().as_ivec3();

    for x in min.x..=max.x {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                if world.is_solid(IVec3::new(x, y, z)) {
                    return true;
                }
            }
        }
    }
    false
}
