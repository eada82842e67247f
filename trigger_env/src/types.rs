//! Common types shared by the trigger core and its collaborators.

use serde::{Deserialize, Serialize};

/// Identifier of an entity slot.
///
/// The generation distinguishes successive occupants of a reused slot, so an
/// overlap reported against a destroyed entity can never be confused with
/// the entity that later took its index. Ordering is lexicographic on
/// `(index, generation)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Slot index
    pub index: u32,

    /// Slot generation, starting at 1 for the first occupant
    pub generation: u32,
}

impl Entity {
    /// The null entity. Never alive, never valid in an overlap.
    pub const NULL: Entity = Entity { index: 0, generation: 0 };

    /// Creates an entity identifier.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns false for the null entity.
    pub fn is_valid(&self) -> bool {
        self.generation != 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Identifies a sub-collider inside a (possibly compound) body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderKey(pub u32);

impl ColliderKey {
    /// Key of a body that has a single, non-compound collider.
    pub const EMPTY: ColliderKey = ColliderKey(u32::MAX);

    /// Returns the raw key value used for ordering.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for ColliderKey {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// One overlap reported by the physics step for the current frame.
///
/// The pair order is whatever the producer chose. Body indices are the
/// physics slots of this frame and carry no identity across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawOverlap {
    pub entity_a: Entity,
    pub entity_b: Entity,
    pub body_index_a: u32,
    pub body_index_b: u32,
    pub collider_key_a: ColliderKey,
    pub collider_key_b: ColliderKey,
}

impl RawOverlap {
    /// Creates an overlap between two single-collider bodies.
    pub fn between(entity_a: Entity, entity_b: Entity) -> Self {
        Self {
            entity_a,
            entity_b,
            body_index_a: entity_a.index,
            body_index_b: entity_b.index,
            collider_key_a: ColliderKey::EMPTY,
            collider_key_b: ColliderKey::EMPTY,
        }
    }

    /// Sets the sub-collider keys.
    pub fn with_colliders(mut self, key_a: ColliderKey, key_b: ColliderKey) -> Self {
        self.collider_key_a = key_a;
        self.collider_key_b = key_b;
        self
    }

    /// Sets the body indices.
    pub fn with_bodies(mut self, body_a: u32, body_b: u32) -> Self {
        self.body_index_a = body_a;
        self.body_index_b = body_b;
        self
    }

    /// Returns the same overlap with the two participants exchanged.
    pub fn swapped(self) -> Self {
        Self {
            entity_a: self.entity_b,
            entity_b: self.entity_a,
            body_index_a: self.body_index_b,
            body_index_b: self.body_index_a,
            collider_key_a: self.collider_key_b,
            collider_key_b: self.collider_key_a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_order_is_index_then_generation() {
        let a = Entity::new(1, 5);
        let b = Entity::new(2, 1);
        let c = Entity::new(2, 3);

        assert!(a < b);
        assert!(b < c);
        assert_eq!(Entity::new(2, 3).cmp(&c), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_null_entity_is_invalid() {
        assert!(!Entity::NULL.is_valid());
        assert!(!Entity::default().is_valid());
        assert!(Entity::new(0, 1).is_valid());
    }

    #[test]
    fn test_swapped_moves_every_field() {
        let raw = RawOverlap::between(Entity::new(3, 1), Entity::new(9, 2))
            .with_colliders(ColliderKey(4), ColliderKey(8))
            .with_bodies(10, 20);

        let flipped = raw.swapped();
        assert_eq!(flipped.entity_a, Entity::new(9, 2));
        assert_eq!(flipped.entity_b, Entity::new(3, 1));
        assert_eq!(flipped.collider_key_a, ColliderKey(8));
        assert_eq!(flipped.collider_key_b, ColliderKey(4));
        assert_eq!(flipped.body_index_a, 20);
        assert_eq!(flipped.body_index_b, 10);
        assert_eq!(flipped.swapped(), raw);
    }

    #[test]
    fn test_entity_display() {
        assert_eq!(Entity::new(12, 3).to_string(), "12v3");
    }
}
