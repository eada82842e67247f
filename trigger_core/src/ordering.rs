//! Deterministic ordering of trigger events.
//!
//! Events are ordered by participant A, then participant B (each
//! lexicographic on index and generation), then the raw collider keys of A
//! and B. The state tag and body indices are ignored, so two records compare
//! equal exactly when they describe the same interaction.

use crate::event::StatefulEvent;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use trigger_env::Entity;

/// The identity of an interaction.
///
/// Field order matters: the derived `Ord` compares fields top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractionKey {
    pub entity_a: Entity,
    pub entity_b: Entity,
    pub collider_a: u32,
    pub collider_b: u32,
}

/// Total order over events, ignoring `state`.
pub fn compare(a: &StatefulEvent, b: &StatefulEvent) -> Ordering {
    a.key().cmp(&b.key())
}

/// Stable in-place sort by [`compare`].
pub fn sort_events(events: &mut [StatefulEvent]) {
    events.sort_by(compare);
}

/// Returns the index of the first element that is not strictly greater than
/// its predecessor, or `None` if the slice is strictly ascending.
pub fn first_unsorted(events: &[StatefulEvent]) -> Option<usize> {
    events
        .windows(2)
        .position(|w| compare(&w[0], &w[1]) != Ordering::Less)
        .map(|i| i + 1)
}
