//! A single gravity block: integrator, terrain bounce, hold constraint and
//! body-vs-body contacts.
//!
//! Bodies are cubes. `position` is the minimum corner and the box spans
//! `size` blocks on every axis from there. Velocity is in blocks per tick.
//!
//! # States
//!
//! ```text
//!            grab(actor)
//!   Free ─────────────────▶ Held
//!    ▲                        │
//!    └────────────────────────┘
//!     release / throw_block / holder went offline
//! ```
//!
//! A free body falls, drags and bounces off solid voxels. A held body
//! springs toward a point in front of its holder's eyes, ignores terrain,
//! and records its motion so a release can carry the momentum forward.

use bevy::math::Vec3;
use std::fmt;

use crate::actor::{ActorDirectory, ActorId};
use crate::collision_geometry::{box_touches_solid, Aabb};
use crate::hold::VelocityHistory;
use crate::physics_math::{
    bounce_horizontal, bounce_vertical, contact_impulse, hold_target, integrate_free_velocity,
    integrate_hold_velocity, release_velocity, smooth_sample, throw_velocity, PhysicsConfig,
};
use crate::visual::VisualKind;
use crate::voxel::SolidityQuery;

/// Identity of a body within one registry. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

impl BodyId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// A simulated cube.
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    id: BodyId,
    /// Minimum corner of the bounding box.
    pub position: Vec3,
    pub velocity: Vec3,
    size: f32,
    kind: VisualKind,
    holder: Option<ActorId>,
    on_ground: bool,
    history: VelocityHistory,
    ticks_since_grabbed: u32,
    last_held_position: Option<Vec3>,
}

impl PhysicsBody {
    /// A free, motionless body. `size` must be positive.
    pub fn new(id: BodyId, position: Vec3, kind: VisualKind, size: f32) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            size,
            kind,
            holder: None,
            on_ground: false,
            history: VelocityHistory::new(),
            ticks_since_grabbed: 0,
            last_held_position: None,
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn kind(&self) -> &VisualKind {
        &self.kind
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn holder(&self) -> Option<ActorId> {
        self.holder
    }

    pub fn is_held_by(&self, actor: ActorId) -> bool {
        self.holder == Some(actor)
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn ticks_since_grabbed(&self) -> u32 {
        self.ticks_since_grabbed
    }

    pub fn history(&self) -> &VelocityHistory {
        &self.history
    }

    pub fn last_held_position(&self) -> Option<Vec3> {
        self.last_held_position
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_body(self.position, self.size)
    }

    /// Centre of the cube.
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::splat(self.size * 0.5)
    }

    /// Advance one tick.
    pub fn tick<W, D>(&mut self, world: &W, actors: &D, config: &PhysicsConfig)
    where
        W: SolidityQuery + ?Sized,
        D: ActorDirectory + ?Sized,
    {
        if self.is_held() {
            self.update_held(actors, config);
            self.ticks_since_grabbed = self.ticks_since_grabbed.saturating_add(1);
            return;
        }

        self.velocity = integrate_free_velocity(self.velocity, self.on_ground, config);

        let next = self.position + self.velocity;
        if box_touches_solid(world, next, self.size) {
            self.resolve_world_collision(world, config);
        } else {
            self.position = next;
            self.on_ground = false;
        }
    }

    /// Bounce off terrain after the full move was found to collide.
    ///
    /// Each axis is tried alone from the current position. Axes whose solo
    /// move collides are bounced and the body stays put this tick. When no
    /// single axis collides (a diagonal corner) the body instead moves by
    /// every axial step that is clear on its own, keeping its velocity.
    fn resolve_world_collision<W>(&mut self, world: &W, config: &PhysicsConfig)
    where
        W: SolidityQuery + ?Sized,
    {
        let current = self.position;
        let size = self.size;
        let touches = |offset: Vec3| box_touches_solid(world, current + offset, size);

        let mut collided = false;

        if touches(Vec3::new(self.velocity.x, 0.0, 0.0)) {
            self.velocity.x = bounce_horizontal(self.velocity.x, config);
            collided = true;
        }

        if touches(Vec3::new(0.0, self.velocity.y, 0.0)) {
            let (y, landed) = bounce_vertical(self.velocity.y, config);
            if landed {
                self.on_ground = true;
            }
            self.velocity.y = y;
            collided = true;
        }

        if touches(Vec3::new(0.0, 0.0, self.velocity.z)) {
            self.velocity.z = bounce_horizontal(self.velocity.z, config);
            collided = true;
        }

        if !collided {
            let mut safe = current;
            for step in [
                Vec3::new(self.velocity.x, 0.0, 0.0),
                Vec3::new(0.0, self.velocity.y, 0.0),
                Vec3::new(0.0, 0.0, self.velocity.z),
            ] {
                if !touches(step) {
                    safe += step;
                }
            }
            self.position = safe;
        }
    }

    fn update_held<D>(&mut self, actors: &D, config: &PhysicsConfig)
    where
        D: ActorDirectory + ?Sized,
    {
        let Some(holder_id) = self.holder else {
            return;
        };
        let Some(holder) = actors.find(holder_id).filter(|actor| actor.is_online()) else {
            bevy::log::warn!(
                "{} lost its holder {}, releasing after {} ticks",
                self.id,
                holder_id,
                self.ticks_since_grabbed
            );
            self.release(config);
            return;
        };

        let target = hold_target(holder.eye_position(), holder.look_direction(), config);
        self.velocity = integrate_hold_velocity(self.velocity, self.position, target, config);

        let new_position = self.position + self.velocity;
        self.position = new_position;

        if let Some(last) = self.last_held_position {
            let raw = new_position - last;
            let sample = if self.ticks_since_grabbed > 0 {
                smooth_sample(self.history.previous(), raw, config)
            } else {
                raw
            };
            self.history.push(sample);
        }

        self.last_held_position = Some(new_position);
    }

    /// Start being carried by `actor`.
    ///
    /// Does not check whether the body is already held or whether the actor
    /// already carries something else. `SimulationRegistry::try_grab` does.
    pub fn grab(&mut self, actor: ActorId) {
        self.holder = Some(actor);
        self.velocity = Vec3::ZERO;
        self.last_held_position = Some(self.position);
        self.ticks_since_grabbed = 0;
        self.on_ground = false;
        self.history.reset();
    }

    /// Stop being carried.
    ///
    /// A hold longer than `min_held_ticks_for_momentum` launches the body
    /// with the averaged history. Shorter holds keep the current velocity.
    pub fn release(&mut self, config: &PhysicsConfig) {
        if self.is_held() && self.ticks_since_grabbed > config.min_held_ticks_for_momentum {
            let samples = self.ticks_since_grabbed as usize;
            let average = self.history.average_of_first(samples);
            self.velocity = release_velocity(average, config);
        }

        self.holder = None;
        self.last_held_position = None;
    }

    /// Release, then launch along `direction` at `power` blocks per tick.
    ///
    /// Any momentum from the release is replaced by the throw.
    pub fn throw_block(&mut self, direction: Vec3, power: f32, config: &PhysicsConfig) {
        self.release(config);
        self.velocity = throw_velocity(direction, power);
    }

    pub fn overlaps(&self, other: &PhysicsBody) -> bool {
        self.bounding_box().overlaps(&other.bounding_box())
    }
}

/// Resolve a contact between two overlapping bodies.
///
/// Applies an equal-mass impulse along the line between their minimum
/// corners, then nudges them apart by `body_separation`. Returns false, and
/// changes nothing, when the corners coincide or the bodies are already
/// moving apart.
pub fn resolve_pair(a: &mut PhysicsBody, b: &mut PhysicsBody, config: &PhysicsConfig) -> bool {
    let Some(normal) = (a.position - b.position).try_normalize() else {
        return false;
    };

    let relative = a.velocity - b.velocity;
    let Some(impulse) = contact_impulse(relative, normal, config.body_restitution) else {
        return false;
    };

    let impulse_vec = normal * impulse;
    a.velocity += impulse_vec;
    b.velocity -= impulse_vec;

    let separation = normal * config.body_separation;
    a.position += separation;
    b.position -= separation;
    true
}
