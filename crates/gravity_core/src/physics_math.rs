//! Pure physics math for gravity blocks.
//!
//! Bodies move in discrete ticks: velocity is measured in blocks per tick
//! and position advances by exactly one velocity each tick. Everything in
//! this module is a plain function of its inputs so each step of the
//! integrator can be unit tested in isolation.
//!
//! # Per-tick pipeline (free body)
//!
//! 1. Gravity, then drag, then ground friction on X/Z
//! 2. Clamp to `max_velocity`
//! 3. Move, or bounce per axis when the move would touch terrain
//!
//! # Per-tick pipeline (held body)
//!
//! 1. Spring toward the holder's hold point, damp, clamp to `max_hold_velocity`
//! 2. Move without terrain checks
//! 3. Record a smoothed displacement sample for release momentum

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

/// Number of velocity samples kept while a body is held.
pub const HOLD_HISTORY_LEN: usize = 5;

/// Tunables for the body integrator, hold constraint and body contacts.
///
/// Defaults are the values the game has always shipped with. Velocities are
/// in blocks per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Subtracted from velocity.y every free tick
    pub gravity: f32,

    /// Velocity multiplier applied every free tick
    pub drag: f32,

    /// Extra X/Z multiplier while resting on the ground
    pub ground_friction: f32,

    /// Fraction of speed kept (after the sign flip) when hitting terrain
    pub bounce_damping: f32,

    /// Speed limit for free bodies
    pub max_velocity: f32,

    /// Vertical impacts slower than this stop the body instead of bouncing
    pub min_bounce_velocity: f32,

    /// Distance in front of the holder's eye where a held body is pulled
    pub hold_distance: f32,

    /// Fraction of the offset to the hold point added to velocity each tick
    pub hold_spring_strength: f32,

    /// Velocity multiplier applied after the spring while held
    pub hold_damping: f32,

    /// Speed limit for held bodies
    pub max_hold_velocity: f32,

    /// Weight of the previous history sample when smoothing
    pub history_previous_weight: f32,

    /// Weight of the new raw displacement when smoothing
    pub history_sample_weight: f32,

    /// Scale applied to the averaged history on release
    pub release_momentum_multiplier: f32,

    /// A hold must last strictly longer than this many ticks to impart momentum
    pub min_held_ticks_for_momentum: u32,

    /// Fraction of approach speed kept after two bodies collide
    pub body_restitution: f32,

    /// Distance each colliding body is pushed along the contact normal
    pub body_separation: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.05,
            drag: 0.985,
            ground_friction: 0.88,
            bounce_damping: 0.65,
            max_velocity: 4.0,
            min_bounce_velocity: 0.08,
            hold_distance: 3.5,
            hold_spring_strength: 0.25,
            hold_damping: 0.75,
            max_hold_velocity: 2.0,
            history_previous_weight: 0.3,
            history_sample_weight: 0.7,
            release_momentum_multiplier: 1.8,
            min_held_ticks_for_momentum: 2,
            body_restitution: 0.7,
            body_separation: 0.05,
        }
    }
}

// =============================================================================
// Free motion
// =============================================================================

/// Velocity after one free tick, before any terrain contact.
///
/// Gravity is applied first, then drag on the whole vector, then ground
/// friction on X/Z only when the body rested on the ground last tick.
/// The result is clamped to `max_velocity` with its direction preserved.
pub fn integrate_free_velocity(velocity: Vec3, on_ground: bool, config: &PhysicsConfig) -> Vec3 {
    let mut v = velocity;
    v.y -= config.gravity;
    v *= config.drag;
    if on_ground {
        v.x *= config.ground_friction;
        v.z *= config.ground_friction;
    }
    v.clamp_length_max(config.max_velocity)
}

/// Horizontal terrain bounce: reverse and damp.
#[inline]
pub fn bounce_horizontal(component: f32, config: &PhysicsConfig) -> f32 {
    -component * config.bounce_damping
}

/// Vertical terrain bounce.
///
/// Returns the new Y velocity and whether the impact was a landing (the
/// body was moving down).
pub fn bounce_vertical(component: f32, config: &PhysicsConfig) -> (f32, bool) {
    let landed = component < 0.0;
    let new_y = if component.abs() < config.min_bounce_velocity {
        0.0
    } else {
        -component * config.bounce_damping
    };
    (new_y, landed)
}

// =============================================================================
// Hold constraint
// =============================================================================

/// Point a held body is pulled toward.
#[inline]
pub fn hold_target(eye: Vec3, look: Vec3, config: &PhysicsConfig) -> Vec3 {
    eye + look * config.hold_distance
}

/// Velocity after one held tick: spring toward `target`, damp, clamp.
pub fn integrate_hold_velocity(
    velocity: Vec3,
    position: Vec3,
    target: Vec3,
    config: &PhysicsConfig,
) -> Vec3 {
    let spring = (target - position) * config.hold_spring_strength;
    let v = (velocity + spring) * config.hold_damping;
    v.clamp_length_max(config.max_hold_velocity)
}

/// Exponential smoothing of a displacement sample against the previous one.
#[inline]
pub fn smooth_sample(previous: Vec3, raw: Vec3, config: &PhysicsConfig) -> Vec3 {
    previous * config.history_previous_weight + raw * config.history_sample_weight
}

/// Launch velocity from the averaged hold history.
#[inline]
pub fn release_velocity(average: Vec3, config: &PhysicsConfig) -> Vec3 {
    (average * config.release_momentum_multiplier).clamp_length_max(config.max_velocity)
}

/// Velocity of an explicit throw. A zero direction throws nothing.
#[inline]
pub fn throw_velocity(direction: Vec3, power: f32) -> Vec3 {
    direction.normalize_or_zero() * power
}

// =============================================================================
// Body contacts
// =============================================================================

/// Scalar impulse for an equal-mass contact, or None when the bodies are
/// already separating along `normal`.
///
/// `relative_velocity` is A's velocity minus B's and `normal` points from B
/// toward A. The caller adds `impulse * normal` to A and subtracts it from B.
pub fn contact_impulse(relative_velocity: Vec3, normal: Vec3, restitution: f32) -> Option<f32> {
    let along_normal = relative_velocity.dot(normal);
    if along_normal > 0.0 {
        return None;
    }
    Some(-(1.0 + restitution) * along_normal / 2.0)
}

// =============================================================================
// Unit Tests
// =============================================================================
