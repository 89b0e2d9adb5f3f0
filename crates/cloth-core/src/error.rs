//! Error types for the cloth kernel.
//!
//! Every fallible operation is a construction or configuration step; once a
//! solver exists, stepping it cannot fail.

use thiserror::Error;

use crate::session::EntityId;

/// Unified error type for cloth construction and session management.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClothError {
    /// The particle grid would contain no particles.
    #[error("Invalid grid dimensions {num_x}x{num_y}: cloth needs at least one particle")]
    InvalidDimensions { num_x: usize, num_y: usize },

    /// Grid spacing must be positive and finite.
    #[error("Invalid spacing {0}: must be positive and finite")]
    InvalidSpacing(f32),

    /// Collision thickness must be positive and finite.
    #[error("Invalid thickness {0}: must be positive and finite")]
    InvalidThickness(f32),

    /// Compliance is an inverse stiffness and cannot be negative.
    #[error("Invalid {kind} compliance {value}: must be non-negative and finite")]
    InvalidCompliance { kind: &'static str, value: f32 },

    /// At least one substep is required per frame.
    #[error("Invalid substep count {0}: must be at least 1")]
    InvalidSubsteps(u32),

    /// Frame timestep must be positive and finite.
    #[error("Invalid frame timestep {0}: must be positive and finite")]
    InvalidTimestep(f32),

    /// A spatial hash needs room for at least one particle.
    #[error("Invalid spatial hash capacity: must hold at least one particle")]
    InvalidCapacity,

    /// A constraint references a particle outside the set.
    #[error("Invalid constraint {index}: endpoint out of range for {particle_count} particles")]
    InvalidConstraint { index: usize, particle_count: usize },

    /// A particle buffer length disagrees with the particle count.
    #[error("Invalid particle set: {field} holds {len} entries, expected {count}")]
    InvalidParticleBuffer {
        field: &'static str,
        len: usize,
        count: usize,
    },

    /// The registry already holds a cloth for this entity.
    #[error("Entity {0} is already registered")]
    DuplicateEntity(EntityId),

    /// No cloth is registered for this entity.
    #[error("Entity {0} is not registered")]
    UnknownEntity(EntityId),
}

/// Convenience alias for `Result<T, ClothError>`.
pub type ClothResult<T> = Result<T, ClothError>;
