//! Frame orchestration for stateful trigger events.
//!
//! One call to [`TriggerEventSystem::update`] runs a whole frame:
//!
//! ```text
//! ClearBuffers -> SwapFrames -> Collect ─┬─ overlaps -> current   ─┬─> SortCurrent -> Diff -> Distribute
//!                                        └─ registry snapshot     ─┘
//!                                              (rayon::join)
//! ```
//!
//! The call returns only after distribution finished, so the returned
//! [`FrameReport`] doubles as the completion signal for downstream systems.

use crate::config::TriggerConfig;
use crate::diff::update_event_states;
use crate::error::TriggerError;
use crate::event::{OverlapState, StatefulEvent};
use crate::fanout::{distribute, RegistrySnapshot};
use crate::frame::FrameBuffers;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use trigger_env::{EventBufferStore, OverlapSource};

/// Stages of one frame, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameStage {
    /// Between frames
    Idle,
    ClearBuffers,
    SwapFrames,
    /// Overlap collection and registry snapshot, joined
    Collect,
    SortCurrent,
    Diff,
    Distribute,
}

impl FrameStage {
    /// The only stage allowed to follow this one.
    pub fn next(&self) -> FrameStage {
        match self {
            FrameStage::Idle => FrameStage::ClearBuffers,
            FrameStage::ClearBuffers => FrameStage::SwapFrames,
            FrameStage::SwapFrames => FrameStage::Collect,
            FrameStage::Collect => FrameStage::SortCurrent,
            FrameStage::SortCurrent => FrameStage::Diff,
            FrameStage::Diff => FrameStage::Distribute,
            FrameStage::Distribute => FrameStage::Idle,
        }
    }

    /// Returns true once the frame buffers have been swapped.
    pub fn is_past_swap(&self) -> bool {
        matches!(
            self,
            FrameStage::Collect | FrameStage::SortCurrent | FrameStage::Diff | FrameStage::Distribute
        )
    }

    /// Returns the stage name.
    pub fn name(&self) -> &'static str {
        match self {
            FrameStage::Idle => "idle",
            FrameStage::ClearBuffers => "clear_buffers",
            FrameStage::SwapFrames => "swap_frames",
            FrameStage::Collect => "collect",
            FrameStage::SortCurrent => "sort_current",
            FrameStage::Diff => "diff",
            FrameStage::Distribute => "distribute",
        }
    }
}

impl std::fmt::Display for FrameStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of one processed frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Frame number, starting at 1
    pub frame: u64,

    /// True if no entity had a buffer and nothing ran
    pub skipped: bool,

    /// Raw overlaps collected this frame
    pub collected: usize,

    /// Repeated interactions dropped after sorting
    pub duplicates: usize,

    /// Entities in the registry snapshot
    pub registered: usize,

    pub enter: usize,
    pub stay: usize,
    pub exit: usize,

    /// Buffer appends performed by the fan-out
    pub appended: usize,
}

impl FrameReport {
    fn skipped(frame: u64) -> Self {
        Self {
            frame,
            skipped: true,
            ..Default::default()
        }
    }

    /// Number of state-tagged events produced by the diff.
    pub fn total(&self) -> usize {
        self.enter + self.stay + self.exit
    }
}

/// Converts per-frame overlap streams into Enter/Stay/Exit events.
///
/// Owns the previous/current frame buffers for its whole lifetime. The
/// overlap source and the buffer store are borrowed per call.
#[derive(Debug)]
pub struct TriggerEventSystem {
    config: TriggerConfig,
    frames: FrameBuffers,
    result: Vec<StatefulEvent>,
    stage: FrameStage,
    frame: u64,
}

impl Default for TriggerEventSystem {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}

impl TriggerEventSystem {
    /// Creates a system with the given configuration.
    pub fn new(config: TriggerConfig) -> Self {
        let frames = FrameBuffers::with_capacity(config.initial_capacity);
        Self {
            result: Vec::with_capacity(config.initial_capacity),
            frames,
            config,
            stage: FrameStage::Idle,
            frame: 0,
        }
    }

    /// Runs one frame.
    ///
    /// If `store` has no registered entity the frame is skipped: buffers are
    /// not swapped and no overlap is collected.
    ///
    /// # Errors
    /// Any [`TriggerError`] aborts the frame before distribution. The next
    /// call discards the aborted collection and diffs against the last
    /// completed frame.
    pub fn update<S>(&mut self, source: &dyn OverlapSource, store: &S) -> Result<FrameReport, TriggerError>
    where
        S: EventBufferStore<StatefulEvent> + ?Sized,
    {
        self.frame += 1;

        if self.stage != FrameStage::Idle {
            warn!("Frame {} aborted during {}; superseding", self.frame - 1, self.stage);
            if self.stage.is_past_swap() {
                self.frames.revert_swap();
            }
            self.stage = FrameStage::Idle;
        }

        if !store.has_registered() {
            trace!("Frame {}: no event buffers, skipping", self.frame);
            return Ok(FrameReport::skipped(self.frame));
        }

        self.advance(FrameStage::ClearBuffers)?;
        store.clear_buffers();

        self.advance(FrameStage::SwapFrames)?;
        self.frames.swap();

        self.advance(FrameStage::Collect)?;
        let pair_order = self.config.pair_order;
        let frames = &mut self.frames;
        let ((), snapshot) = rayon::join(
            || source.emit_overlaps(&frames.collector(pair_order)),
            || RegistrySnapshot::build(store),
        );
        let collected = self.frames.current().len();

        self.advance(FrameStage::SortCurrent)?;
        for event in self.frames.current() {
            event.validate()?;
        }
        let duplicates = self.frames.sort_current();
        if duplicates > 0 {
            debug!("Frame {}: dropped {} duplicate overlaps", self.frame, duplicates);
        }

        self.advance(FrameStage::Diff)?;
        let (previous, current) = self.frames.split();
        update_event_states(previous, current, &mut self.result)?;

        self.advance(FrameStage::Distribute)?;
        let appended = distribute(
            &self.result,
            &snapshot,
            store,
            self.config.distribution,
            self.config.parallel_threshold,
        );

        self.advance(FrameStage::Idle)?;

        let mut report = FrameReport {
            frame: self.frame,
            skipped: false,
            collected,
            duplicates,
            registered: snapshot.len(),
            appended,
            ..Default::default()
        };
        for event in &self.result {
            trace!(
                "Frame {}: {} ({}, {}) keys ({}, {})",
                self.frame,
                event.state,
                event.entity_a,
                event.entity_b,
                event.collider_key_a.value(),
                event.collider_key_b.value()
            );
            match event.state {
                OverlapState::Enter => report.enter += 1,
                OverlapState::Stay => report.stay += 1,
                OverlapState::Exit => report.exit += 1,
            }
        }

        debug!(
            "Frame {}: {} collected, {} enter / {} stay / {} exit, {} appends",
            report.frame, report.collected, report.enter, report.stay, report.exit, report.appended
        );

        Ok(report)
    }

    fn advance(&mut self, to: FrameStage) -> Result<(), TriggerError> {
        if self.stage.next() != to {
            return Err(TriggerError::StageOrder { from: self.stage, to });
        }
        self.stage = to;
        Ok(())
    }

    /// State-tagged events of the last completed frame (Exit included).
    pub fn result(&self) -> &[StatefulEvent] {
        &self.result
    }

    /// Interactions alive at the end of the last completed frame.
    pub fn active_events(&self) -> &[StatefulEvent] {
        self.frames.current()
    }

    /// Frames processed so far, skipped ones included.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Current pipeline stage; `Idle` between frames.
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Forgets all tracked interactions.
    ///
    /// The next frame reports every overlap as `Enter` and nothing as `Exit`.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.result.clear();
        self.stage = FrameStage::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PairOrder;
    use trigger_env::{ColliderKey, Entity, EventBuffers, RawOverlap};

    fn a() -> Entity {
        Entity::new(1, 1)
    }

    fn b() -> Entity {
        Entity::new(2, 1)
    }

    fn store_with(entities: &[Entity]) -> EventBuffers<StatefulEvent> {
        let mut store: EventBuffers<StatefulEvent> = EventBuffers::new();
        for e in entities {
            store.register(*e).unwrap();
        }
        store
    }

    fn state_of(store: &EventBuffers<StatefulEvent>, e: Entity) -> Vec<OverlapState> {
        store.events(e).unwrap().iter().map(|ev| ev.state).collect()
    }

    #[test]
    fn test_four_frame_lifecycle() {
        let store = store_with(&[a(), b()]);
        let mut system = TriggerEventSystem::default();
        let touching = vec![RawOverlap::between(a(), b())];
        let apart: Vec<RawOverlap> = Vec::new();

        let r1 = system.update(&touching, &store).unwrap();
        assert_eq!((r1.enter, r1.stay, r1.exit), (1, 0, 0));
        assert_eq!(state_of(&store, a()), vec![OverlapState::Enter]);
        assert_eq!(state_of(&store, b()), vec![OverlapState::Enter]);

        let r2 = system.update(&touching, &store).unwrap();
        assert_eq!((r2.enter, r2.stay, r2.exit), (0, 1, 0));
        assert_eq!(state_of(&store, a()), vec![OverlapState::Stay]);

        let r3 = system.update(&apart, &store).unwrap();
        assert_eq!((r3.enter, r3.stay, r3.exit), (0, 0, 1));
        assert_eq!(state_of(&store, b()), vec![OverlapState::Exit]);

        let r4 = system.update(&apart, &store).unwrap();
        assert_eq!(r4.total(), 0);
        assert!(store.events(a()).unwrap().is_empty());
        assert_eq!(system.frame_count(), 4);
        assert_eq!(system.stage(), FrameStage::Idle);
    }

    #[test]
    fn test_previous_is_state_tagged() {
        let store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();
        let touching = vec![RawOverlap::between(a(), b())];

        system.update(&touching, &store).unwrap();
        assert_eq!(system.active_events()[0].state, OverlapState::Enter);

        system.update(&touching, &store).unwrap();
        assert_eq!(system.active_events()[0].state, OverlapState::Stay);
    }

    #[test]
    fn test_no_buffers_skips_frame() {
        let store: EventBuffers<StatefulEvent> = EventBuffers::new();
        let mut system = TriggerEventSystem::default();
        let touching = vec![RawOverlap::between(a(), b())];

        let report = system.update(&touching, &store).unwrap();

        assert!(report.skipped);
        assert_eq!(report.collected, 0);
        assert!(system.active_events().is_empty());
    }

    #[test]
    fn test_skipped_frame_keeps_previous() {
        let mut store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();
        let touching = vec![RawOverlap::between(a(), b())];

        system.update(&touching, &store).unwrap();
        store.exclude(a()).unwrap();
        assert!(system.update(&touching, &store).unwrap().skipped);
        store.include(a()).unwrap();

        let report = system.update(&touching, &store).unwrap();
        assert_eq!(report.stay, 1);
    }

    #[test]
    fn test_unregistered_participants_still_tracked() {
        // Only a has a buffer; the b-c interaction is diffed but not delivered.
        let c = Entity::new(3, 1);
        let store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();
        let overlaps = vec![RawOverlap::between(a(), b()), RawOverlap::between(b(), c)];

        let report = system.update(&overlaps, &store).unwrap();

        assert_eq!(report.enter, 2);
        assert_eq!(report.appended, 1);
        assert_eq!(report.registered, 1);
    }

    #[test]
    fn test_self_overlap_fills_buffer_twice() {
        let store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();
        let overlaps = vec![RawOverlap::between(a(), a()).with_colliders(ColliderKey(0), ColliderKey(1))];

        let report = system.update(&overlaps, &store).unwrap();

        assert_eq!(report.enter, 1);
        assert_eq!(report.appended, 2);
        assert_eq!(state_of(&store, a()), vec![OverlapState::Enter, OverlapState::Enter]);
    }

    #[test]
    fn test_flipped_pairs_with_canonical_order_stay() {
        let store = store_with(&[a(), b()]);
        let forward = vec![RawOverlap::between(a(), b())];
        let backward = vec![RawOverlap::between(b(), a())];

        let mut reported = TriggerEventSystem::default();
        reported.update(&forward, &store).unwrap();
        let r = reported.update(&backward, &store).unwrap();
        assert_eq!((r.enter, r.stay, r.exit), (1, 0, 1));

        let mut canonical =
            TriggerEventSystem::new(TriggerConfig::default().with_pair_order(PairOrder::Canonical));
        canonical.update(&forward, &store).unwrap();
        let r = canonical.update(&backward, &store).unwrap();
        assert_eq!((r.enter, r.stay, r.exit), (0, 1, 0));
    }

    #[test]
    fn test_invalid_participant_aborts_frame() {
        let store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();

        system.update(&vec![RawOverlap::between(a(), b())], &store).unwrap();

        let bad = vec![RawOverlap::between(a(), Entity::NULL)];
        let err = system.update(&bad, &store).unwrap_err();
        assert!(matches!(err, TriggerError::InvalidParticipant { .. }));
        assert_eq!(system.stage(), FrameStage::SortCurrent);

        // The aborted frame is discarded; the a-b contact from frame 1 exits.
        let report = system.update(&Vec::<RawOverlap>::new(), &store).unwrap();
        assert_eq!((report.enter, report.stay, report.exit), (0, 0, 1));
        assert_eq!(system.stage(), FrameStage::Idle);
    }

    #[test]
    fn test_duplicates_are_reported() {
        let store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();
        let overlaps = vec![RawOverlap::between(a(), b()), RawOverlap::between(a(), b())];

        let report = system.update(&overlaps, &store).unwrap();

        assert_eq!(report.collected, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.enter, 1);
        assert_eq!(store.events(a()).unwrap().len(), 1);
    }

    #[test]
    fn test_buffers_are_cleared_each_frame() {
        let store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();
        let touching = vec![RawOverlap::between(a(), b())];

        for _ in 0..5 {
            system.update(&touching, &store).unwrap();
            assert_eq!(store.events(a()).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_reset_forgets_interactions() {
        let store = store_with(&[a()]);
        let mut system = TriggerEventSystem::default();
        let touching = vec![RawOverlap::between(a(), b())];

        system.update(&touching, &store).unwrap();
        system.reset();
        let report = system.update(&touching, &store).unwrap();

        assert_eq!((report.enter, report.stay), (1, 0));
    }

    #[test]
    fn test_stage_order() {
        let mut stage = FrameStage::Idle;
        let mut seen = Vec::new();
        for _ in 0..7 {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                FrameStage::ClearBuffers,
                FrameStage::SwapFrames,
                FrameStage::Collect,
                FrameStage::SortCurrent,
                FrameStage::Diff,
                FrameStage::Distribute,
                FrameStage::Idle,
            ]
        );
    }

    #[test]
    fn test_advance_rejects_skipped_stage() {
        let mut system = TriggerEventSystem::default();
        let err = system.advance(FrameStage::Diff).unwrap_err();
        assert_eq!(
            err,
            TriggerError::StageOrder {
                from: FrameStage::Idle,
                to: FrameStage::Diff
            }
        );
        assert_eq!(system.stage(), FrameStage::Idle);
    }
}
