//! Error types for the trigger core.

use crate::system::FrameStage;
use thiserror::Error;
use trigger_env::Entity;

/// Invariant violations detected while processing a frame.
///
/// None of these are recoverable within the frame: the orchestrator stops
/// before distribution so that a broken order never reaches the buffers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// An overlap referenced the null entity
    #[error("Invalid participant {entity} in overlap ({entity_a}, {entity_b})")]
    InvalidParticipant {
        entity: Entity,
        entity_a: Entity,
        entity_b: Entity,
    },

    /// `other()` was asked with an entity that takes no part in the event
    #[error("Entity {entity} is not a participant of ({entity_a}, {entity_b})")]
    ForeignEntity {
        entity: Entity,
        entity_a: Entity,
        entity_b: Entity,
    },

    /// A diff input was not strictly ascending
    #[error("{buffer} frame events are not strictly sorted at index {index}")]
    UnsortedFrame { buffer: &'static str, index: usize },

    /// The frame pipeline tried to skip or repeat a stage
    #[error("Illegal stage transition {from} -> {to}")]
    StageOrder { from: FrameStage, to: FrameStage },

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl TriggerError {
    /// Creates a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
