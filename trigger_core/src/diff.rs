//! Sorted merge-diff between two frames.
//!
//! Both inputs are strictly ascending by [`compare`], so one pass with two
//! cursors classifies every interaction:
//!
//! ```text
//! current:  A   B       D
//! previous:     B   C   D
//! result:   A+  B=  C-  D=      (+ Enter, = Stay, - Exit)
//! ```

use crate::error::TriggerError;
use crate::event::{OverlapState, StatefulEvent};
use crate::ordering::{compare, first_unsorted};
use std::cmp::Ordering;

/// Merges `previous` and `current` into `result` with states assigned.
///
/// `result` is cleared first. Events of `current` are also tagged in place
/// (`Enter` or `Stay`) so the buffer can serve as next frame's `previous`.
///
/// # Errors
/// [`TriggerError::UnsortedFrame`] if either input is not strictly
/// ascending. Nothing is written in that case.
pub fn update_event_states(
    previous: &[StatefulEvent],
    current: &mut [StatefulEvent],
    result: &mut Vec<StatefulEvent>,
) -> Result<(), TriggerError> {
    if let Some(index) = first_unsorted(previous) {
        return Err(TriggerError::UnsortedFrame { buffer: "previous", index });
    }
    if let Some(index) = first_unsorted(current) {
        return Err(TriggerError::UnsortedFrame { buffer: "current", index });
    }

    result.clear();
    result.reserve(current.len() + previous.len());

    let (mut i, mut j) = (0, 0);
    while i < current.len() && j < previous.len() {
        match compare(&current[i], &previous[j]) {
            Ordering::Equal => {
                // Present in both frames
                current[i].state = OverlapState::Stay;
                result.push(current[i]);
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                // New this frame
                current[i].state = OverlapState::Enter;
                result.push(current[i]);
                i += 1;
            }
            Ordering::Greater => {
                // Gone this frame
                result.push(previous[j].with_state(OverlapState::Exit));
                j += 1;
            }
        }
    }

    for event in &mut current[i..] {
        event.state = OverlapState::Enter;
        result.push(*event);
    }
    result.extend(previous[j..].iter().map(|e| e.with_state(OverlapState::Exit)));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trigger_env::{Entity, RawOverlap};

    fn event(a: u32, b: u32) -> StatefulEvent {
        StatefulEvent::from_raw(RawOverlap::between(Entity::new(a, 1), Entity::new(b, 1)))
    }

    fn states(result: &[StatefulEvent]) -> Vec<(u32, u32, OverlapState)> {
        result
            .iter()
            .map(|e| (e.entity_a.index, e.entity_b.index, e.state))
            .collect()
    }

    #[test]
    fn test_empty_previous_is_all_enter() {
        let mut current = vec![event(1, 2), event(3, 4)];
        let mut result = Vec::new();

        update_event_states(&[], &mut current, &mut result).unwrap();

        assert_eq!(
            states(&result),
            vec![(1, 2, OverlapState::Enter), (3, 4, OverlapState::Enter)]
        );
    }

    #[test]
    fn test_empty_current_is_all_exit() {
        let previous = vec![event(1, 2).with_state(OverlapState::Stay), event(3, 4)];
        let mut result = Vec::new();

        update_event_states(&previous, &mut [], &mut result).unwrap();

        assert_eq!(
            states(&result),
            vec![(1, 2, OverlapState::Exit), (3, 4, OverlapState::Exit)]
        );
    }

    #[test]
    fn test_both_empty() {
        let mut result = vec![event(9, 9)];
        update_event_states(&[], &mut [], &mut result).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_interleaved_merge() {
        let previous = vec![event(2, 0), event(3, 0), event(4, 0)];
        let mut current = vec![event(1, 0), event(2, 0), event(4, 0), event(5, 0)];
        let mut result = Vec::new();

        update_event_states(&previous, &mut current, &mut result).unwrap();

        assert_eq!(
            states(&result),
            vec![
                (1, 0, OverlapState::Enter),
                (2, 0, OverlapState::Stay),
                (3, 0, OverlapState::Exit),
                (4, 0, OverlapState::Stay),
                (5, 0, OverlapState::Enter),
            ]
        );
    }

    #[test]
    fn test_current_is_tagged_in_place() {
        let previous = vec![event(2, 0)];
        let mut current = vec![event(1, 0), event(2, 0)];
        let mut result = Vec::new();

        update_event_states(&previous, &mut current, &mut result).unwrap();

        assert_eq!(current[0].state, OverlapState::Enter);
        assert_eq!(current[1].state, OverlapState::Stay);
    }

    #[test]
    fn test_trailing_previous_after_current_exhausted() {
        let previous = vec![event(1, 0), event(7, 0), event(8, 0)];
        let mut current = vec![event(1, 0)];
        let mut result = Vec::new();

        update_event_states(&previous, &mut current, &mut result).unwrap();

        assert_eq!(
            states(&result),
            vec![
                (1, 0, OverlapState::Stay),
                (7, 0, OverlapState::Exit),
                (8, 0, OverlapState::Exit),
            ]
        );
    }

    #[test]
    fn test_unsorted_input_is_rejected() {
        let mut current = vec![event(5, 0), event(1, 0)];
        let mut result = vec![event(9, 9)];

        let err = update_event_states(&[], &mut current, &mut result).unwrap_err();

        assert_eq!(err, TriggerError::UnsortedFrame { buffer: "current", index: 1 });
        // Untouched on failure
        assert_eq!(result, vec![event(9, 9)]);
    }

    #[test]
    fn test_duplicate_previous_is_rejected() {
        let previous = vec![event(1, 0), event(1, 0)];
        let mut result = Vec::new();

        let err = update_event_states(&previous, &mut [], &mut result).unwrap_err();
        assert_eq!(err, TriggerError::UnsortedFrame { buffer: "previous", index: 1 });
    }

    #[test]
    fn test_exit_keeps_previous_payload() {
        let mut old = event(1, 2);
        old.body_index_a = 42;
        let mut result = Vec::new();

        update_event_states(&[old], &mut [], &mut result).unwrap();

        assert_eq!(result[0].body_index_a, 42);
        assert_eq!(result[0].state, OverlapState::Exit);
    }
}
