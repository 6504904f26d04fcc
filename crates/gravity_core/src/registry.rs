//! The set of live gravity blocks and the tick that drives them.
//!
//! `SimulationRegistry` owns every body in insertion order. One `tick`:
//!
//! 1. Ticks each body in order (hold spring, or gravity and terrain bounce)
//! 2. Sweeps every pair `(i, j)` with `i < j` and resolves overlaps in place,
//!    so a body's second contact in a tick sees the velocity left by its
//!    first
//! 3. Reports a visual move for every body whose position changed
//!
//! The registry is a plain value (and a bevy `Resource`), never a global.
//! Callers own it and pass in the terrain, the actor directory and the
//! visual sink for each call that needs them.

use bevy::math::Vec3;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorDirectory, ActorId};
use crate::physics_body::{resolve_pair, BodyId, PhysicsBody};
use crate::physics_math::PhysicsConfig;
use crate::spawn::SpawnRequest;
use crate::visual::VisualSink;
use crate::voxel::SolidityQuery;

/// Fixed-rate scheduling of ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per tick (default: 1/20 second).
    pub fixed_timestep: f32,
    /// Maximum ticks run by one `step` call to prevent spiral of death.
    pub max_steps_per_frame: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 20.0,
            max_steps_per_frame: 4,
        }
    }
}

/// Why an exclusive grab was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabError {
    /// No body with this id
    UnknownBody(BodyId),
    /// The body is already carried by someone
    AlreadyHeld { body: BodyId, holder: ActorId },
    /// The actor is already carrying another body
    ActorBusy { actor: ActorId, holding: BodyId },
}

impl std::fmt::Display for GrabError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrabError::UnknownBody(id) => write!(f, "Unknown body: {}", id),
            GrabError::AlreadyHeld { body, holder } => {
                write!(f, "{} is already held by {}", body, holder)
            }
            GrabError::ActorBusy { actor, holding } => {
                write!(f, "{} is already holding {}", actor, holding)
            }
        }
    }
}

impl std::error::Error for GrabError {}

/// Result type for exclusive grabs.
pub type GrabResult<T> = Result<T, GrabError>;

/// Owner of all live bodies.
#[derive(Resource, Debug, Default)]
pub struct SimulationRegistry {
    /// Live bodies in insertion order.
    bodies: Vec<PhysicsBody>,
    /// Raw id handed to the next spawn.
    next_id: u64,
    physics: PhysicsConfig,
    simulation: SimulationConfig,
    /// Unsimulated time carried between `step` calls.
    accumulator: f32,
    tick_count: u64,
}

impl SimulationRegistry {
    pub fn new(physics: PhysicsConfig, simulation: SimulationConfig) -> Self {
        Self {
            physics,
            simulation,
            ..Default::default()
        }
    }

    /// Create with default configuration.
    pub fn with_default_config() -> Self {
        Self::default()
    }

    pub fn physics_config(&self) -> &PhysicsConfig {
        &self.physics
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Add a body and create its visual.
    pub fn spawn<V>(&mut self, request: SpawnRequest, visuals: &mut V) -> BodyId
    where
        V: VisualSink + ?Sized,
    {
        let id = BodyId::from_raw(self.next_id);
        self.next_id += 1;

        let body = PhysicsBody::new(id, request.position(), request.kind().clone(), request.size());
        visuals.spawn_visual(id, body.kind(), body.size(), body.position);
        bevy::log::info!(
            "Spawned {} ({}, size {}) at {}",
            id,
            body.kind(),
            body.size(),
            body.position
        );

        self.bodies.push(body);
        id
    }

    /// Remove a body and its visual. Unknown ids are ignored.
    pub fn remove<V>(&mut self, id: BodyId, visuals: &mut V) -> bool
    where
        V: VisualSink + ?Sized,
    {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let body = self.bodies.remove(index);
        visuals.despawn_visual(id);
        bevy::log::info!("Removed {} at {}", id, body.position);
        true
    }

    /// Release and remove every body. Returns how many were removed.
    pub fn clear<V>(&mut self, visuals: &mut V) -> usize
    where
        V: VisualSink + ?Sized,
    {
        let count = self.bodies.len();
        for mut body in self.bodies.drain(..) {
            body.release(&self.physics);
            visuals.despawn_visual(body.id());
        }
        bevy::log::info!("Cleared {} gravity block(s)", count);
        count
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance every body by one tick, then resolve body contacts.
    pub fn tick<W, D, V>(&mut self, world: &W, actors: &D, visuals: &mut V)
    where
        W: SolidityQuery + ?Sized,
        D: ActorDirectory + ?Sized,
        V: VisualSink + ?Sized,
    {
        let config = &self.physics;
        let before: Vec<Vec3> = self.bodies.iter().map(|body| body.position).collect();

        for body in self.bodies.iter_mut() {
            body.tick(world, actors, config);
        }

        for i in 0..self.bodies.len() {
            let (head, tail) = self.bodies.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                if a.overlaps(b) {
                    resolve_pair(a, b, config);
                }
            }
        }

        for (body, previous) in self.bodies.iter().zip(before) {
            if body.position != previous {
                visuals.move_visual(body.id(), body.position);
            }
        }

        self.tick_count += 1;
    }

    /// Run as many fixed ticks as `delta` seconds cover.
    ///
    /// Leftover time carries to the next call. Returns the number of ticks
    /// run, at most `max_steps_per_frame`; time beyond that is dropped.
    /// A negative or non-finite `delta` runs nothing and is discarded.
    pub fn step<W, D, V>(&mut self, delta: f32, world: &W, actors: &D, visuals: &mut V) -> u32
    where
        W: SolidityQuery + ?Sized,
        D: ActorDirectory + ?Sized,
        V: VisualSink + ?Sized,
    {
        if !delta.is_finite() || delta < 0.0 {
            bevy::log::warn!("Ignoring invalid frame delta {}", delta);
            return 0;
        }

        let timestep = self.simulation.fixed_timestep;
        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= timestep && steps < self.simulation.max_steps_per_frame {
            self.tick(world, actors, visuals);
            self.accumulator -= timestep;
            steps += 1;
        }

        if self.accumulator >= timestep {
            bevy::log::debug!(
                "Dropping {:.3}s of simulation after {} ticks",
                self.accumulator - self.accumulator % timestep,
                steps
            );
            self.accumulator %= timestep;
        }
        steps
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Closest body whose box the actor's line of sight enters within
    /// `max_distance`. Held bodies count.
    pub fn find_targeted<A>(&self, actor: &A, max_distance: f32) -> Option<BodyId>
    where
        A: Actor + ?Sized,
    {
        let direction = actor.look_direction().try_normalize()?;
        let eye = actor.eye_position();

        let mut closest: Option<(BodyId, f32)> = None;
        for body in &self.bodies {
            let Some(distance) = body.bounding_box().ray_distance(eye, direction, max_distance) else {
                continue;
            };
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((body.id(), distance));
            }
        }
        closest.map(|(id, _)| id)
    }

    /// First body, in insertion order, carried by `actor`.
    pub fn find_held_by(&self, actor: ActorId) -> Option<BodyId> {
        self.bodies
            .iter()
            .find(|body| body.is_held_by(actor))
            .map(|body| body.id())
    }

    pub fn body(&self, id: BodyId) -> Option<&PhysicsBody> {
        self.bodies.iter().find(|body| body.id() == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut PhysicsBody> {
        self.bodies.iter_mut().find(|body| body.id() == id)
    }

    /// Bodies in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = &PhysicsBody> {
        self.bodies.iter()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|body| body.id() == id)
    }

    // =========================================================================
    // Hold / throw
    // =========================================================================

    /// Put a body in `actor`'s hands without any exclusivity check.
    /// Returns false for unknown ids.
    pub fn grab(&mut self, id: BodyId, actor: ActorId) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        body.grab(actor);
        bevy::log::debug!("{} grabbed {}", actor, id);
        true
    }

    /// Grab only if the body is free and the actor's hands are empty.
    pub fn try_grab(&mut self, id: BodyId, actor: ActorId) -> GrabResult<()> {
        let body = self.body(id).ok_or(GrabError::UnknownBody(id))?;
        if let Some(holder) = body.holder() {
            return Err(GrabError::AlreadyHeld { body: id, holder });
        }
        if let Some(holding) = self.find_held_by(actor) {
            return Err(GrabError::ActorBusy { actor, holding });
        }
        self.grab(id, actor);
        Ok(())
    }

    /// Returns false for unknown ids.
    pub fn release(&mut self, id: BodyId) -> bool {
        let config = &self.physics;
        let Some(body) = self.bodies.iter_mut().find(|body| body.id() == id) else {
            return false;
        };
        body.release(config);
        bevy::log::debug!("Released {} with velocity {}", id, body.velocity);
        true
    }

    /// Release and launch along `direction`. Returns false for unknown ids.
    pub fn throw_block(&mut self, id: BodyId, direction: Vec3, power: f32) -> bool {
        let config = &self.physics;
        let Some(body) = self.bodies.iter_mut().find(|body| body.id() == id) else {
            return false;
        };
        body.throw_block(direction, power, config);
        bevy::log::debug!("Threw {} with velocity {}", id, body.velocity);
        true
    }
}
