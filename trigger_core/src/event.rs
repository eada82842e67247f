//! Stateful trigger event records.

use crate::error::TriggerError;
use crate::ordering::InteractionKey;
use serde::{Deserialize, Serialize};
use trigger_env::{ColliderKey, Entity, RawOverlap};

/// Lifecycle of an interaction as seen by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OverlapState {
    /// The interaction began this frame
    #[default]
    Enter,

    /// The interaction existed last frame and still does
    Stay,

    /// The interaction existed last frame and ended this frame
    Exit,
}

impl OverlapState {
    /// Short lowercase name used in logs and exports.
    pub fn name(&self) -> &'static str {
        match self {
            OverlapState::Enter => "enter",
            OverlapState::Stay => "stay",
            OverlapState::Exit => "exit",
        }
    }
}

impl std::fmt::Display for OverlapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One overlapping pair plus the state assigned by the diff.
///
/// Two records describe the same interaction when their [`InteractionKey`]s
/// are equal; `state` and the body indices play no part in that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatefulEvent {
    pub entity_a: Entity,
    pub entity_b: Entity,
    pub body_index_a: u32,
    pub body_index_b: u32,
    pub collider_key_a: ColliderKey,
    pub collider_key_b: ColliderKey,

    /// Assigned by the diff engine only
    pub state: OverlapState,
}

impl StatefulEvent {
    /// Creates an untagged record from a raw overlap.
    pub fn from_raw(raw: RawOverlap) -> Self {
        Self {
            entity_a: raw.entity_a,
            entity_b: raw.entity_b,
            body_index_a: raw.body_index_a,
            body_index_b: raw.body_index_b,
            collider_key_a: raw.collider_key_a,
            collider_key_b: raw.collider_key_b,
            state: OverlapState::default(),
        }
    }

    /// Returns the fields that identify the interaction.
    pub fn key(&self) -> InteractionKey {
        InteractionKey {
            entity_a: self.entity_a,
            entity_b: self.entity_b,
            collider_a: self.collider_key_a.value(),
            collider_b: self.collider_key_b.value(),
        }
    }

    /// Returns a copy tagged with `state`.
    pub fn with_state(mut self, state: OverlapState) -> Self {
        self.state = state;
        self
    }

    /// Returns true if `entity` is one of the two participants.
    pub fn involves(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }

    /// Returns the participant that is not `entity`.
    ///
    /// For a self-overlap both participants are `entity`, so `entity` is
    /// returned.
    pub fn other(&self, entity: Entity) -> Result<Entity, TriggerError> {
        if entity == self.entity_b {
            Ok(self.entity_a)
        } else if entity == self.entity_a {
            Ok(self.entity_b)
        } else {
            Err(TriggerError::ForeignEntity {
                entity,
                entity_a: self.entity_a,
                entity_b: self.entity_b,
            })
        }
    }

    /// Returns the record with participants ordered so that
    /// `entity_a <= entity_b`, swapping colliders and bodies along with them.
    pub fn canonicalized(self) -> Self {
        if self.entity_b < self.entity_a {
            Self {
                entity_a: self.entity_b,
                entity_b: self.entity_a,
                body_index_a: self.body_index_b,
                body_index_b: self.body_index_a,
                collider_key_a: self.collider_key_b,
                collider_key_b: self.collider_key_a,
                state: self.state,
            }
        } else {
            self
        }
    }

    /// Checks that both participants are live identifiers.
    pub fn validate(&self) -> Result<(), TriggerError> {
        for entity in [self.entity_a, self.entity_b] {
            if !entity.is_valid() {
                return Err(TriggerError::InvalidParticipant {
                    entity,
                    entity_a: self.entity_a,
                    entity_b: self.entity_b,
                });
            }
        }
        Ok(())
    }
}

impl From<RawOverlap> for StatefulEvent {
    fn from(raw: RawOverlap) -> Self {
        Self::from_raw(raw)
    }
}
