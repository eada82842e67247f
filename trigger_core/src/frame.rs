//! Double-buffered per-frame event storage.

use crate::config::PairOrder;
use crate::event::StatefulEvent;
use crate::ordering::{compare, sort_events};
use parking_lot::Mutex;
use std::cmp::Ordering;
use trigger_env::{OverlapSink, RawOverlap};

/// Previous and current frame event lists.
///
/// Both vectors live as long as the owner. Each frame they trade places and
/// the new `current` is cleared, so steady-state frames allocate nothing.
#[derive(Debug, Default)]
pub struct FrameBuffers {
    previous: Vec<StatefulEvent>,
    current: Vec<StatefulEvent>,
}

impl FrameBuffers {
    /// Creates empty buffers with `capacity` reserved on both sides.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            previous: Vec::with_capacity(capacity),
            current: Vec::with_capacity(capacity),
        }
    }

    /// Moves `current` into `previous` and empties the new `current`.
    ///
    /// No elements are copied; the old `previous` allocation is reused.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
    }

    /// Undoes a [`swap`](Self::swap) whose frame never completed.
    ///
    /// `previous` becomes `current` again, so the next swap puts the last
    /// completed frame back in `previous`.
    pub fn revert_swap(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    /// Appends one event to `current`.
    pub fn collect(&mut self, event: StatefulEvent) {
        self.current.push(event);
    }

    /// Returns a sink that appends to `current` from any number of threads.
    pub fn collector(&mut self, pair_order: PairOrder) -> EventCollector<'_> {
        EventCollector {
            current: Mutex::new(&mut self.current),
            pair_order,
        }
    }

    /// Sorts `current` and collapses repeated interactions.
    ///
    /// Returns how many duplicates were dropped.
    pub fn sort_current(&mut self) -> usize {
        sort_events(&mut self.current);
        let before = self.current.len();
        self.current.dedup_by(|a, b| compare(a, b) == Ordering::Equal);
        before - self.current.len()
    }

    /// Returns `(previous, current)` for the diff.
    pub fn split(&mut self) -> (&[StatefulEvent], &mut [StatefulEvent]) {
        (&self.previous, &mut self.current)
    }

    /// Events of the last completed frame.
    pub fn previous(&self) -> &[StatefulEvent] {
        &self.previous
    }

    /// Events of the frame in progress (or just completed).
    pub fn current(&self) -> &[StatefulEvent] {
        &self.current
    }

    /// Capacities of `(previous, current)`.
    pub fn capacity(&self) -> (usize, usize) {
        (self.previous.capacity(), self.current.capacity())
    }

    /// Forgets both frames.
    pub fn clear(&mut self) {
        self.previous.clear();
        self.current.clear();
    }
}

/// Concurrency-safe appender into the current frame.
pub struct EventCollector<'a> {
    current: Mutex<&'a mut Vec<StatefulEvent>>,
    pair_order: PairOrder,
}

impl OverlapSink for EventCollector<'_> {
    fn push(&self, overlap: RawOverlap) {
        let event = match self.pair_order {
            PairOrder::AsReported => StatefulEvent::from_raw(overlap),
            PairOrder::Canonical => StatefulEvent::from_raw(overlap).canonicalized(),
        };
        self.current.lock().push(event);
    }
}
