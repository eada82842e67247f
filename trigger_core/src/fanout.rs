//! Fan-out of state-tagged events into per-entity buffers.

use crate::config::DistributionMode;
use crate::event::StatefulEvent;
use rayon::prelude::*;
use std::collections::HashSet;
use trigger_env::{Entity, EventBufferStore};

/// Entities that own a non-excluded buffer this frame.
///
/// Built fresh every frame and dropped after distribution.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entities: HashSet<Entity>,
}

impl RegistrySnapshot {
    /// Snapshots the store's registered entities.
    pub fn build<S>(store: &S) -> Self
    where
        S: EventBufferStore<StatefulEvent> + ?Sized,
    {
        Self::from_entities(store.registered_entities())
    }

    /// Creates a snapshot from an explicit entity list.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        Self {
            entities: entities.into_iter().collect(),
        }
    }

    /// Returns true if `entity` has a buffer to append to.
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Number of entities in the snapshot.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity has a buffer.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Appends `event` to the buffer of each registered participant.
///
/// Returns the number of appends (0, 1 or 2). A self-overlap counts both sides.
fn route<S>(event: &StatefulEvent, snapshot: &RegistrySnapshot, store: &S) -> usize
where
    S: EventBufferStore<StatefulEvent> + ?Sized,
{
    let mut appended = 0;
    if snapshot.contains(event.entity_a) {
        store.append(event.entity_a, *event);
        appended += 1;
    }
    if snapshot.contains(event.entity_b) {
        store.append(event.entity_b, *event);
        appended += 1;
    }
    appended
}

/// Distributes every event into the buffers of its registered participants.
///
/// Buffers must already be cleared for the frame. Participants missing from
/// `snapshot` are skipped silently. Returns the total number of appends.
pub fn distribute<S>(
    events: &[StatefulEvent],
    snapshot: &RegistrySnapshot,
    store: &S,
    mode: DistributionMode,
    parallel_threshold: usize,
) -> usize
where
    S: EventBufferStore<StatefulEvent> + ?Sized,
{
    if snapshot.is_empty() {
        return 0;
    }

    match mode {
        DistributionMode::Parallel if events.len() >= parallel_threshold => events
            .par_iter()
            .map(|event| route(event, snapshot, store))
            .sum(),
        _ => events.iter().map(|event| route(event, snapshot, store)).sum(),
    }
}
