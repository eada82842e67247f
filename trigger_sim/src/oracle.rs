//! Brute-force reference model for trigger states.
//!
//! Tracks the set of live interactions with plain set arithmetic and checks
//! every frame produced by the sorted merge against it.

use std::collections::{BTreeMap, BTreeSet};
use trigger_core::{InteractionKey, OverlapState, PairOrder, StatefulEvent};
use trigger_env::{OverlapSource, VecSink};

/// Expected outcome of one frame, not yet committed.
#[derive(Debug, Clone, Default)]
pub struct Expectation {
    live: BTreeSet<InteractionKey>,
    states: BTreeMap<InteractionKey, OverlapState>,
}

impl Expectation {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Expected state of one interaction.
    pub fn state(&self, key: &InteractionKey) -> Option<OverlapState> {
        self.states.get(key).copied()
    }
}

/// Reference model of the interactions alive after the last frame.
#[derive(Debug, Clone, Default)]
pub struct Oracle {
    pair_order: PairOrder,
    live: BTreeSet<InteractionKey>,
}

impl Oracle {
    pub fn new(pair_order: PairOrder) -> Self {
        Self {
            pair_order,
            live: BTreeSet::new(),
        }
    }

    /// Interactions alive after the last committed frame.
    pub fn live(&self) -> &BTreeSet<InteractionKey> {
        &self.live
    }

    /// Computes what the next frame should report for `source`.
    pub fn expect(&self, source: &dyn OverlapSource) -> Expectation {
        let sink = VecSink::new();
        source.emit_overlaps(&sink);

        let live: BTreeSet<InteractionKey> = sink
            .into_inner()
            .into_iter()
            .map(|raw| {
                let event = StatefulEvent::from_raw(raw);
                match self.pair_order {
                    PairOrder::AsReported => event.key(),
                    PairOrder::Canonical => event.canonicalized().key(),
                }
            })
            .collect();

        let mut states = BTreeMap::new();
        for key in &live {
            let state = if self.live.contains(key) {
                OverlapState::Stay
            } else {
                OverlapState::Enter
            };
            states.insert(*key, state);
        }
        for key in self.live.difference(&live) {
            states.insert(*key, OverlapState::Exit);
        }

        Expectation { live, states }
    }

    /// Accepts `expectation` as the new frame.
    pub fn commit(&mut self, expectation: Expectation) {
        self.live = expectation.live;
    }

    /// Compares a produced frame with the expectation.
    ///
    /// Returns a description of the first mismatch.
    pub fn verify(expectation: &Expectation, produced: &[StatefulEvent]) -> Result<(), String> {
        if produced.len() != expectation.len() {
            return Err(format!(
                "expected {} events, got {}",
                expectation.len(),
                produced.len()
            ));
        }
        for event in produced {
            match expectation.state(&event.key()) {
                Some(state) if state == event.state => {}
                Some(state) => {
                    return Err(format!(
                        "({}, {}) expected {}, got {}",
                        event.entity_a, event.entity_b, state, event.state
                    ))
                }
                None => {
                    return Err(format!(
                        "({}, {}) reported as {} but not expected",
                        event.entity_a, event.entity_b, event.state
                    ))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trigger_core::TriggerEventSystem;
    use trigger_env::{Entity, EventBuffers, RawOverlap};

    fn e(index: u32) -> Entity {
        Entity::new(index, 1)
    }

    #[test]
    fn test_expectation_tracks_lifecycle() {
        let mut oracle = Oracle::default();
        let touching = vec![RawOverlap::between(e(1), e(2))];
        let apart: Vec<RawOverlap> = Vec::new();

        let first = oracle.expect(&touching);
        assert_eq!(first.len(), 1);
        oracle.commit(first);

        let second = oracle.expect(&touching);
        let key = StatefulEvent::from_raw(touching[0]).key();
        assert_eq!(second.state(&key), Some(OverlapState::Stay));
        oracle.commit(second);

        let third = oracle.expect(&apart);
        assert_eq!(third.state(&key), Some(OverlapState::Exit));
        oracle.commit(third);

        assert!(oracle.expect(&apart).is_empty());
    }

    #[test]
    fn test_agrees_with_trigger_system() {
        let mut store: EventBuffers<StatefulEvent> = EventBuffers::new();
        store.register(e(1)).unwrap();
        let mut system = TriggerEventSystem::default();
        let mut oracle = Oracle::default();

        let frames = [
            vec![RawOverlap::between(e(1), e(2)), RawOverlap::between(e(3), e(1))],
            vec![RawOverlap::between(e(3), e(1))],
            vec![RawOverlap::between(e(1), e(3)), RawOverlap::between(e(2), e(4))],
            vec![],
        ];
        for frame in &frames {
            let expected = oracle.expect(frame);
            system.update(frame, &store).unwrap();
            assert_eq!(Oracle::verify(&expected, system.result()), Ok(()));
            oracle.commit(expected);
        }
    }

    #[test]
    fn test_verify_reports_mismatch() {
        let oracle = Oracle::default();
        let touching = vec![RawOverlap::between(e(1), e(2))];
        let expected = oracle.expect(&touching);

        let wrong = StatefulEvent::from_raw(touching[0]).with_state(OverlapState::Stay);
        let err = Oracle::verify(&expected, &[wrong]).unwrap_err();
        assert!(err.contains("expected enter"));
    }
}
