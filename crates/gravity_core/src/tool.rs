//! Input mapping for the gravity stick.
//!
//! | Action    | Holding a body        | Hands empty                       |
//! |-----------|-----------------------|-----------------------------------|
//! | Primary   | release it            | grab the targeted body            |
//! | Secondary | throw it along gaze   | delete the targeted body          |
//!
//! Targeting looks `target_distance` blocks along the actor's gaze. A body
//! someone else is holding cannot be grabbed.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::physics_body::BodyId;
use crate::registry::{GrabError, SimulationRegistry};
use crate::visual::VisualSink;

/// Tunables for the stick and for spawning in front of an actor.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// How far the stick reaches, in blocks
    pub target_distance: f32,
    /// Throw speed in blocks per tick
    pub throw_power: f32,
    /// Distance in front of the eyes where spawned bodies appear
    pub spawn_distance: f32,
    /// Edge length of bodies spawned without an explicit size
    pub default_size: f32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            target_distance: 10.0,
            throw_power: 1.5,
            spawn_distance: 3.0,
            default_size: 1.0,
        }
    }
}

/// Which button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    /// Grab or release (right click)
    Primary,
    /// Throw or delete (left click)
    Secondary,
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    Grabbed(BodyId),
    Released(BodyId),
    /// The targeted body is carried by someone
    AlreadyHeld(BodyId),
    Threw(BodyId),
    Deleted(BodyId),
    /// Nothing within reach
    NoTarget,
}

/// Apply one stick action for `actor`.
pub fn apply_tool_action<A, V>(
    registry: &mut SimulationRegistry,
    actor: &A,
    action: ToolAction,
    config: &ToolConfig,
    visuals: &mut V,
) -> ToolOutcome
where
    A: Actor + ?Sized,
    V: VisualSink + ?Sized,
{
    let held = registry.find_held_by(actor.id());

    match (action, held) {
        (ToolAction::Primary, Some(id)) => {
            registry.release(id);
            ToolOutcome::Released(id)
        }
        (ToolAction::Primary, None) => {
            let Some(id) = registry.find_targeted(actor, config.target_distance) else {
                return ToolOutcome::NoTarget;
            };
            match registry.try_grab(id, actor.id()) {
                Ok(()) => ToolOutcome::Grabbed(id),
                Err(GrabError::AlreadyHeld { .. }) => ToolOutcome::AlreadyHeld(id),
                // The actor held nothing a moment ago and the id came from a
                // live lookup, so these cannot happen.
                Err(GrabError::ActorBusy { .. }) | Err(GrabError::UnknownBody(_)) => {
                    ToolOutcome::NoTarget
                }
            }
        }
        (ToolAction::Secondary, Some(id)) => {
            registry.throw_block(id, actor.look_direction(), config.throw_power);
            ToolOutcome::Threw(id)
        }
        (ToolAction::Secondary, None) => {
            let Some(id) = registry.find_targeted(actor, config.target_distance) else {
                return ToolOutcome::NoTarget;
            };
            registry.remove(id, visuals);
            ToolOutcome::Deleted(id)
        }
    }
}
