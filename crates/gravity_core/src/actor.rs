//! Actors that can aim at, carry and throw bodies.
//!
//! Bodies never own their holder. They store an [`ActorId`] and look the
//! actor up through an [`ActorDirectory`] every tick, so an actor that
//! disconnects or is removed is noticed on the next tick.

use bevy::math::Vec3;
use bevy::prelude::Resource;
use std::collections::HashMap;
use std::fmt;

/// Standing eye height above an avatar's feet, in blocks.
pub const DEFAULT_EYE_HEIGHT: f32 = 1.62;

/// Stable identity of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Read-only view of an actor.
pub trait Actor {
    fn id(&self) -> ActorId;

    /// Feet position.
    fn position(&self) -> Vec3;

    fn eye_position(&self) -> Vec3;

    /// Unit vector the actor is looking along.
    fn look_direction(&self) -> Vec3;

    /// Offline actors are treated as gone.
    fn is_online(&self) -> bool;
}

/// Lookup of actors by id.
pub trait ActorDirectory {
    fn find(&self, id: ActorId) -> Option<&dyn Actor>;
}

/// Plain-data actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    id: ActorId,
    position: Vec3,
    eye_height: f32,
    look_direction: Vec3,
    online: bool,
}

impl Avatar {
    /// Online avatar at `position` looking along +Z.
    pub fn new(id: ActorId, position: Vec3) -> Self {
        Self {
            id,
            position,
            eye_height: DEFAULT_EYE_HEIGHT,
            look_direction: Vec3::Z,
            online: true,
        }
    }

    pub fn with_eye_height(mut self, eye_height: f32) -> Self {
        self.eye_height = eye_height;
        self
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Point the avatar along `direction`. A zero direction is ignored.
    pub fn set_look_direction(&mut self, direction: Vec3) {
        if let Some(dir) = direction.try_normalize() {
            self.look_direction = dir;
        }
    }

    /// Aim using yaw and pitch in degrees.
    ///
    /// Yaw 0 looks along +Z and grows clockwise seen from above (yaw 90
    /// looks along -X). Positive pitch looks down.
    pub fn set_rotation(&mut self, yaw_degrees: f32, pitch_degrees: f32) {
        let yaw = yaw_degrees.to_radians();
        let pitch = pitch_degrees.to_radians();
        let horizontal = pitch.cos();
        self.look_direction = Vec3::new(
            -yaw.sin() * horizontal,
            -pitch.sin(),
            yaw.cos() * horizontal,
        );
    }

    /// Turn to face `target` from the eyes.
    pub fn look_at(&mut self, target: Vec3) {
        self.set_look_direction(target - self.eye_position());
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }
}

impl Actor for Avatar {
    fn id(&self) -> ActorId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn eye_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.eye_height, 0.0)
    }

    fn look_direction(&self) -> Vec3 {
        self.look_direction
    }

    fn is_online(&self) -> bool {
        self.online
    }
}

/// All known avatars, keyed by id.
#[derive(Resource, Debug, Default)]
pub struct ActorRoster {
    actors: HashMap<ActorId, Avatar>,
}

impl ActorRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an avatar. Returns the avatar previously stored under
    /// the same id.
    pub fn insert(&mut self, avatar: Avatar) -> Option<Avatar> {
        self.actors.insert(avatar.id, avatar)
    }

    pub fn get(&self, id: ActorId) -> Option<&Avatar> {
        self.actors.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Avatar> {
        self.actors.get_mut(&id)
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Avatar> {
        self.actors.remove(&id)
    }

    /// Returns false if no avatar has this id.
    pub fn set_online(&mut self, id: ActorId, online: bool) -> bool {
        match self.actors.get_mut(&id) {
            Some(avatar) => {
                avatar.set_online(online);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl ActorDirectory for ActorRoster {
    fn find(&self, id: ActorId) -> Option<&dyn Actor> {
        self.actors.get(&id).map(|avatar| avatar as &dyn Actor)
    }
}
