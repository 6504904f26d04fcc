//! Validated spawn requests.
//!
//! Everything that reaches the registry has already been checked here, so
//! the integrator can assume finite positions and a positive size.

use bevy::math::Vec3;

use crate::actor::Actor;
use crate::visual::VisualKind;

/// Errors that can occur when building a spawn request.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnError {
    /// Position has a NaN or infinite component
    NonFinitePosition(Vec3),
    /// Size is NaN, infinite, zero or negative
    InvalidSize(f32),
    /// Visual kind is not a lowercase identifier
    InvalidKind(String),
}

impl std::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnError::NonFinitePosition(p) => write!(f, "Position is not finite: {}", p),
            SpawnError::InvalidSize(s) => write!(f, "Size must be a positive number, got {}", s),
            SpawnError::InvalidKind(k) => write!(f, "Invalid visual kind: {:?}", k),
        }
    }
}

impl std::error::Error for SpawnError {}

/// Result type for spawn validation.
pub type SpawnResult<T> = Result<T, SpawnError>;

/// Where a new body appears, what it looks like and how big it is.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    position: Vec3,
    kind: VisualKind,
    size: f32,
}

impl SpawnRequest {
    /// `position` is the minimum corner of the body's box.
    pub fn new(position: Vec3, kind: VisualKind, size: f32) -> SpawnResult<Self> {
        if !position.is_finite() {
            return Err(SpawnError::NonFinitePosition(position));
        }
        if !size.is_finite() || size <= 0.0 {
            return Err(SpawnError::InvalidSize(size));
        }
        Ok(Self {
            position,
            kind,
            size,
        })
    }

    /// Parse the kind from text, then validate like [`SpawnRequest::new`].
    pub fn parse(position: Vec3, kind: &str, size: f32) -> SpawnResult<Self> {
        Self::new(position, VisualKind::parse(kind)?, size)
    }

    /// Body placed `distance` blocks along the actor's line of sight.
    pub fn in_front_of<A>(actor: &A, kind: VisualKind, size: f32, distance: f32) -> SpawnResult<Self>
    where
        A: Actor + ?Sized,
    {
        let position = actor.eye_position() + actor.look_direction() * distance;
        Self::new(position, kind, size)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn kind(&self) -> &VisualKind {
        &self.kind
    }

    pub fn size(&self) -> f32 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorId, Avatar};

    fn stone() -> VisualKind {
        VisualKind::parse("stone").expect("valid kind")
    }

    #[test]
    fn test_valid_request() {
        let request = SpawnRequest::new(Vec3::new(1.0, 2.0, 3.0), stone(), 1.5).expect("valid");
        assert_eq!(request.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(request.size(), 1.5);
        assert_eq!(request.kind().as_str(), "stone");
    }

    #[test]
    fn test_rejects_bad_sizes() {
        for size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let result = SpawnRequest::new(Vec3::ZERO, stone(), size);
            assert!(matches!(result, Err(SpawnError::InvalidSize(_))), "size {size}");
        }
    }

    #[test]
    fn test_rejects_non_finite_position() {
        let result = SpawnRequest::new(Vec3::new(0.0, f32::NAN, 0.0), stone(), 1.0);
        assert!(matches!(result, Err(SpawnError::NonFinitePosition(_))));
    }

    #[test]
    fn test_parse_propagates_kind_error() {
        let result = SpawnRequest::parse(Vec3::ZERO, "not a block", 1.0);
        assert!(matches!(result, Err(SpawnError::InvalidKind(_))));
        assert!(result.unwrap_err().to_string().contains("not a block"));
    }

    #[test]
    fn test_in_front_of_actor() {
        let mut avatar = Avatar::new(ActorId(1), Vec3::new(0.0, 10.0, 0.0));
        avatar.set_look_direction(Vec3::X);

        let request = SpawnRequest::in_front_of(&avatar, stone(), 1.0, 3.0).expect("valid");

        assert!(request
            .position()
            .abs_diff_eq(Vec3::new(3.0, 11.62, 0.0), 1e-5));
    }
}
