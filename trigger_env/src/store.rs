//! Per-entity output buffer store abstraction.

use crate::types::Entity;

/// The external owner of per-entity event buffers.
///
/// The trigger core never creates or destroys buffers. Each frame it asks the
/// store to clear every buffer, takes a snapshot of which entities currently
/// have one, and then appends this frame's events.
///
/// # Exclusion
///
/// An entity may carry a buffer and still opt out of trigger processing.
/// Excluded entities are not cleared, not reported by
/// [`registered_entities`](Self::registered_entities), and never appended to.
pub trait EventBufferStore<T>: Sync {
    /// Clears the buffer of every registered, non-excluded entity.
    ///
    /// Capacity should be retained; this runs once per frame.
    fn clear_buffers(&self);

    /// Returns the entities that have a buffer and are not excluded.
    fn registered_entities(&self) -> Vec<Entity>;

    /// Returns true if at least one entity would be reported by
    /// [`registered_entities`](Self::registered_entities).
    fn has_registered(&self) -> bool {
        !self.registered_entities().is_empty()
    }

    /// Appends one event to an entity's buffer.
    ///
    /// Called only for entities present in this frame's registry snapshot.
    /// Appends to the same entity may arrive from several threads.
    fn append(&self, entity: Entity, event: T);
}
