//! Error types for the trigger environment abstraction.

use crate::types::Entity;
use thiserror::Error;

/// Errors that can occur when talking to a collaborator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// The entity has no output buffer in this store
    #[error("Entity {0} has no registered event buffer")]
    UnknownEntity(Entity),

    /// The null entity was used where a live entity is required
    #[error("Null entity cannot own an event buffer")]
    NullEntity,
}

impl EnvError {
    /// Creates an unknown-entity error.
    pub fn unknown(entity: Entity) -> Self {
        Self::UnknownEntity(entity)
    }
}
