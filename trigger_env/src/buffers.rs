//! Reference implementation of [`EventBufferStore`] backed by a hash map.

use crate::error::EnvError;
use crate::store::EventBufferStore;
use crate::types::Entity;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;

/// One entity's output buffer plus its exclusion marker.
#[derive(Debug)]
struct BufferSlot<T> {
    excluded: bool,
    events: Mutex<Vec<T>>,
}

/// Per-entity event buffers.
///
/// Structural changes (register, unregister, exclude) need `&mut self` and
/// happen between frames. Appends go through a per-entity lock, so frames can
/// distribute into different entities' buffers concurrently.
#[derive(Debug)]
pub struct EventBuffers<T> {
    slots: HashMap<Entity, BufferSlot<T>>,
}

impl<T> Default for EventBuffers<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<T> EventBuffers<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `entity` an empty buffer. Registering twice keeps the existing
    /// buffer and exclusion marker.
    pub fn register(&mut self, entity: Entity) -> Result<(), EnvError> {
        if !entity.is_valid() {
            return Err(EnvError::NullEntity);
        }
        self.slots.entry(entity).or_insert_with(|| BufferSlot {
            excluded: false,
            events: Mutex::new(Vec::new()),
        });
        Ok(())
    }

    /// Removes the buffer of `entity`, returning whether it had one.
    pub fn unregister(&mut self, entity: Entity) -> bool {
        self.slots.remove(&entity).is_some()
    }

    /// Marks `entity` as opted out of trigger processing.
    pub fn exclude(&mut self, entity: Entity) -> Result<(), EnvError> {
        let slot = self
            .slots
            .get_mut(&entity)
            .ok_or_else(|| EnvError::unknown(entity))?;
        slot.excluded = true;
        Ok(())
    }

    /// Clears the opt-out marker of `entity`.
    pub fn include(&mut self, entity: Entity) -> Result<(), EnvError> {
        let slot = self
            .slots
            .get_mut(&entity)
            .ok_or_else(|| EnvError::unknown(entity))?;
        slot.excluded = false;
        Ok(())
    }

    /// Returns true if `entity` has a buffer (excluded or not).
    pub fn is_registered(&self, entity: Entity) -> bool {
        self.slots.contains_key(&entity)
    }

    /// Returns true if `entity` has a buffer and opted out.
    pub fn is_excluded(&self, entity: Entity) -> bool {
        self.slots.get(&entity).map(|s| s.excluded).unwrap_or(false)
    }

    /// Runs `f` over the current contents of an entity's buffer.
    pub fn with_events<R>(&self, entity: Entity, f: impl FnOnce(&[T]) -> R) -> Result<R, EnvError> {
        let slot = self.slots.get(&entity).ok_or_else(|| EnvError::unknown(entity))?;
        let events = slot.events.lock();
        Ok(f(&events))
    }

    /// Number of entities with a buffer.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no entity has a buffer.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T: Clone> EventBuffers<T> {
    /// Returns a copy of an entity's buffer.
    pub fn events(&self, entity: Entity) -> Result<Vec<T>, EnvError> {
        self.with_events(entity, |events| events.to_vec())
    }
}

impl<T: Send> EventBufferStore<T> for EventBuffers<T> {
    fn clear_buffers(&self) {
        self.slots
            .par_iter()
            .filter(|(_, slot)| !slot.excluded)
            .for_each(|(_, slot)| slot.events.lock().clear());
    }

    fn registered_entities(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .slots
            .iter()
            .filter(|(_, slot)| !slot.excluded)
            .map(|(entity, _)| *entity)
            .collect();
        entities.sort_unstable();
        entities
    }

    fn has_registered(&self) -> bool {
        self.slots.values().any(|slot| !slot.excluded)
    }

    fn append(&self, entity: Entity, event: T) {
        // Unknown or excluded entities are skipped, not reported.
        if let Some(slot) = self.slots.get(&entity) {
            if !slot.excluded {
                slot.events.lock().push(event);
            }
        }
    }
}
