//! # Election Evaluator
//!
//! Pure leadership decision over a snapshot of live registrations.
//!
//! The entry with the smallest sequence id leads. Every other candidate
//! follows and watches its immediate predecessor only, never the leader or
//! the whole sibling set. A predecessor's deletion then triggers
//! re-evaluation in exactly one hop per rank change, O(n) notifications for
//! a full cascade of n candidates instead of the O(n²) herd produced when
//! everyone watches the head.

use crate::{ElectionEntry, ElectionError, ElectionSnapshot, Result, Role, SequenceId};

/// Outcome of evaluating a snapshot for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// `Role::Leader` or `Role::Follower`
    pub role: Role,
    /// Entry to watch; always `Some` for a follower, `None` for the leader
    pub watch_target: Option<ElectionEntry>,
}

/// Decides this candidate's role and watch target from a fresh snapshot.
///
/// # Errors
///
/// - [`ElectionError::StaleEntry`] when `my_sequence_id` is absent from the
///   snapshot: the entry was deleted or expired concurrently and the caller
///   must re-register before evaluating again.
/// - [`ElectionError::CorruptedState`] when the snapshot carries duplicate
///   sequence ids, which violates the coordination service's uniqueness
///   guarantee. Fatal, never retried.
///
/// # Examples
///
/// ```rust
/// use zelect_core::{evaluate, ElectionEntry, ElectionSnapshot, Role, SequenceId};
///
/// let snapshot = ElectionSnapshot::new(vec![
///     ElectionEntry::unowned(SequenceId::new(1), "/election/candidate_0000000001"),
///     ElectionEntry::unowned(SequenceId::new(2), "/election/candidate_0000000002"),
/// ]);
///
/// let eval = evaluate(&snapshot, SequenceId::new(2)).unwrap();
/// assert_eq!(eval.role, Role::Follower);
/// assert_eq!(eval.watch_target.unwrap().sequence_id, SequenceId::new(1));
/// ```
pub fn evaluate(snapshot: &ElectionSnapshot, my_sequence_id: SequenceId) -> Result<Evaluation> {
    if let Some(dup) = snapshot.first_duplicate() {
        return Err(ElectionError::corrupted(format!(
            "duplicate sequence id {dup} in election snapshot"
        )));
    }

    if !snapshot.contains(my_sequence_id) {
        return Err(ElectionError::StaleEntry {
            sequence_id: my_sequence_id,
        });
    }

    if snapshot.head().map(|e| e.sequence_id) == Some(my_sequence_id) {
        return Ok(Evaluation {
            role: Role::Leader,
            watch_target: None,
        });
    }

    match snapshot.predecessor_of(my_sequence_id) {
        Some(predecessor) => Ok(Evaluation {
            role: Role::Follower,
            watch_target: Some(predecessor.clone()),
        }),
        // Unreachable while the snapshot contains a non-minimal own entry.
        None => Err(ElectionError::corrupted(format!(
            "entry {my_sequence_id} is not minimal yet has no predecessor"
        ))),
    }
}
