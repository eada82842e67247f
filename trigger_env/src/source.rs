//! Overlap source abstraction (the physics step boundary).

use crate::types::RawOverlap;
use parking_lot::Mutex;

/// Receiver for raw overlaps produced during one frame.
///
/// Implementations must tolerate `push` being called from several worker
/// threads at once. No ordering is assumed between pushes.
pub trait OverlapSink: Sync {
    /// Accepts one overlap for the current frame.
    fn push(&self, overlap: RawOverlap);
}

/// Producer of the current frame's raw overlaps.
///
/// # Implementations
///
/// - **Engine**: wraps the trigger-event stream of a physics step
/// - **Simulation**: all-pairs sphere test in `trigger_sim`
/// - **Tests**: a plain `Vec<RawOverlap>` or slice
///
/// # Flow
///
/// ```text
/// physics step            sink                   trigger core
///      |-- push(overlap) -->|                          |
///      |-- push(overlap) -->|                          |
///      |                    |-- current frame list --->|-- sort/diff
/// ```
pub trait OverlapSource: Sync {
    /// Pushes every overlap of the current frame into `sink`.
    ///
    /// The count may be zero and the order is arbitrary.
    fn emit_overlaps(&self, sink: &dyn OverlapSink);
}

impl OverlapSource for [RawOverlap] {
    fn emit_overlaps(&self, sink: &dyn OverlapSink) {
        for overlap in self {
            sink.push(*overlap);
        }
    }
}

impl OverlapSource for Vec<RawOverlap> {
    fn emit_overlaps(&self, sink: &dyn OverlapSink) {
        self.as_slice().emit_overlaps(sink);
    }
}

/// Mutex-guarded sink collecting into a vector.
///
/// Mostly useful for tests and for inspecting what a source produces.
#[derive(Debug, Default)]
pub struct VecSink {
    overlaps: Mutex<Vec<RawOverlap>>,
}

impl VecSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the sink and returns everything pushed so far.
    pub fn into_inner(self) -> Vec<RawOverlap> {
        self.overlaps.into_inner()
    }

    /// Number of overlaps pushed so far.
    pub fn len(&self) -> usize {
        self.overlaps.lock().len()
    }

    /// Returns true if nothing was pushed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OverlapSink for VecSink {
    fn push(&self, overlap: RawOverlap) {
        self.overlaps.lock().push(overlap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entity;

    #[test]
    fn test_vec_source_emits_in_order() {
        let source = vec![
            RawOverlap::between(Entity::new(1, 1), Entity::new(2, 1)),
            RawOverlap::between(Entity::new(0, 1), Entity::new(5, 1)),
        ];

        let sink = VecSink::new();
        source.emit_overlaps(&sink);

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.into_inner(), source);
    }

    #[test]
    fn test_sink_accepts_concurrent_pushes() {
        let sink = VecSink::new();

        std::thread::scope(|scope| {
            for t in 0..4u32 {
                let sink = &sink;
                scope.spawn(move || {
                    for i in 0..100u32 {
                        sink.push(RawOverlap::between(Entity::new(t, 1), Entity::new(i, 1)));
                    }
                });
            }
        });

        assert_eq!(sink.len(), 400);
    }
}
