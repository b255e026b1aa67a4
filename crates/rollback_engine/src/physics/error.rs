//! Physics errors

use thiserror::Error;

use crate::foundation::memory::AllocError;
use super::body::BodyHandle;
use super::collider::ColliderHandle;

/// Errors from the physics world
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// The body handle is out of range or its slot was reused
    #[error("Stale body handle {0:?}")]
    StaleBodyHandle(BodyHandle),

    /// The collider handle is out of range or its slot was reused
    #[error("Stale collider handle {0:?}")]
    StaleColliderHandle(ColliderHandle),

    /// A body needs positive mass to occupy a slot
    #[error("Body mass must be positive, got {mass}")]
    InvalidBody {
        /// Rejected mass
        mass: f32,
    },

    /// Broad-phase storage could not be reserved
    #[error("Broad phase allocation failed: {0}")]
    Alloc(#[from] AllocError),

    /// The physics configuration was rejected
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),
}
