//! Error types for the simulation harness.

use thiserror::Error;
use trigger_core::TriggerError;
use trigger_env::{EnvError, Entity};

/// Errors that can stop a simulation tick.
#[derive(Debug, Error)]
pub enum SimError {
    /// Trigger pipeline rejected the frame
    #[error("trigger frame failed: {0}")]
    Trigger(#[from] TriggerError),

    /// Event buffer store rejected an operation
    #[error("event buffers: {0}")]
    Env(#[from] EnvError),

    #[error("entity {0} already has a physics body")]
    DuplicateBody(Entity),

    #[error("entity {0} has no physics body")]
    MissingBody(Entity),

    /// Scenario configuration cannot be run
    #[error("invalid simulation config: {0}")]
    Config(String),
}

impl SimError {
    /// Creates a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_error_converts() {
        let err: SimError = TriggerError::config("bad threshold").into();
        assert!(matches!(err, SimError::Trigger(_)));
    }

    #[test]
    fn test_display_names_entity() {
        let err = SimError::MissingBody(Entity::new(3, 2));
        assert_eq!(err.to_string(), "entity 3v2 has no physics body");
    }
}
