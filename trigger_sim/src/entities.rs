//! Generational entity allocator.

use std::collections::VecDeque;
use trigger_env::Entity;

/// Hands out entity identifiers and recycles freed slots.
///
/// A recycled slot gets a bumped generation, so stale identifiers held by
/// the trigger core never match the new occupant.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation per slot
    generations: Vec<u32>,
    alive: Vec<bool>,
    /// Freed slots, oldest first
    free: VecDeque<u32>,
}

impl EntityAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new entity, reusing a free slot if any.
    pub fn spawn(&mut self) -> Entity {
        if let Some(index) = self.free.pop_front() {
            let slot = index as usize;
            // Generation 0 is reserved for the null entity
            self.generations[slot] = self.generations[slot].checked_add(1).unwrap_or(1);
            self.alive[slot] = true;
            Entity::new(index, self.generations[slot])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(1);
            self.alive.push(true);
            Entity::new(index, 1)
        }
    }

    /// Frees an entity. Returns false if it was not alive.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index as usize;
        self.alive[slot] = false;
        self.free.push_back(entity.index);
        true
    }

    /// Returns true if `entity` is the current occupant of its slot.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index as usize;
        slot < self.generations.len() && self.alive[slot] && self.generations[slot] == entity.generation
    }

    /// Number of live entities.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_sequential_indices() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.spawn(), Entity::new(0, 1));
        assert_eq!(alloc.spawn(), Entity::new(1, 1));
        assert_eq!(alloc.alive_count(), 2);
    }

    #[test]
    fn test_reused_slot_bumps_generation() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.spawn();
        assert!(alloc.despawn(first));

        let second = alloc.spawn();
        assert_eq!(second.index, first.index);
        assert_eq!(second.generation, 2);
        assert!(!alloc.is_alive(first));
        assert!(alloc.is_alive(second));
    }

    #[test]
    fn test_freed_slots_reused_oldest_first() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.spawn();
        let b = alloc.spawn();
        alloc.despawn(b);
        alloc.despawn(a);

        assert_eq!(alloc.spawn().index, b.index);
        assert_eq!(alloc.spawn().index, a.index);
    }

    #[test]
    fn test_generation_wrap_skips_zero() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.spawn();
        alloc.generations[e.index as usize] = u32::MAX;
        assert!(alloc.despawn(Entity::new(e.index, u32::MAX)));

        let reused = alloc.spawn();
        assert_eq!(reused, Entity::new(e.index, 1));
        assert!(reused.is_valid());
    }

    #[test]
    fn test_double_despawn_fails() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.spawn();
        assert!(alloc.despawn(e));
        assert!(!alloc.despawn(e));
        assert!(!alloc.is_alive(Entity::new(42, 1)));
        assert!(!alloc.is_alive(Entity::NULL));
    }
}
