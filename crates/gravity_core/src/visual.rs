//! Visual placeholders that track bodies.
//!
//! The simulation never renders anything itself. It reports what changed
//! through a [`VisualSink`], and a renderer (or the [`VisualQueue`]
//! resource) decides what to do with it.

use bevy::math::Vec3;
use bevy::prelude::Resource;
use std::fmt;

use crate::physics_body::BodyId;
use crate::spawn::SpawnError;

/// Longest accepted visual kind identifier.
pub const MAX_VISUAL_KIND_LEN: usize = 64;

/// Identifier of what a body looks like, e.g. `stone` or `oak_planks`.
///
/// Input is trimmed and lowercased, then must be non-empty and made only of
/// `a-z`, `0-9` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisualKind(String);

impl VisualKind {
    pub fn parse(raw: &str) -> Result<Self, SpawnError> {
        let name = raw.trim().to_ascii_lowercase();
        let valid = !name.is_empty()
            && name.len() <= MAX_VISUAL_KIND_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if valid {
            Ok(Self(name))
        } else {
            Err(SpawnError::InvalidKind(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output port for visual side effects.
pub trait VisualSink {
    fn spawn_visual(&mut self, id: BodyId, kind: &VisualKind, size: f32, position: Vec3);

    fn move_visual(&mut self, id: BodyId, position: Vec3);

    fn despawn_visual(&mut self, id: BodyId);
}

/// One recorded visual side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualCommand {
    Spawn {
        id: BodyId,
        kind: VisualKind,
        size: f32,
        position: Vec3,
    },
    Move {
        id: BodyId,
        position: Vec3,
    },
    Despawn {
        id: BodyId,
    },
}

/// Sink that records commands in order for a renderer to drain.
#[derive(Resource, Debug, Default)]
pub struct VisualQueue {
    commands: Vec<VisualCommand>,
}

impl VisualQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending command, oldest first.
    pub fn drain(&mut self) -> Vec<VisualCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn pending(&self) -> &[VisualCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl VisualSink for VisualQueue {
    fn spawn_visual(&mut self, id: BodyId, kind: &VisualKind, size: f32, position: Vec3) {
        self.commands.push(VisualCommand::Spawn {
            id,
            kind: kind.clone(),
            size,
            position,
        });
    }

    fn move_visual(&mut self, id: BodyId, position: Vec3) {
        self.commands.push(VisualCommand::Move { id, position });
    }

    fn despawn_visual(&mut self, id: BodyId) {
        self.commands.push(VisualCommand::Despawn { id });
    }
}
