//! # Core Types
//!
//! Fundamental types used throughout the zelect leader election protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for a candidate instance.
///
/// Typically built from hostname and pid. The instance id is carried for
/// observability only; leadership is decided exclusively by sequence-number
/// ordering, never by comparing instance ids.
///
/// # Examples
///
/// ```rust
/// use zelect_core::InstanceId;
///
/// let id = InstanceId::new("worker-3:4182");
/// println!("Instance: {}", id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    /// Creates an instance id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Sequence number assigned by the coordination service at entry creation.
///
/// Sequence ids are unique among siblings of one election path and totally
/// ordered; the entry holding the smallest id is the leader by definition.
/// Ids assigned after a session expiry are strictly greater than every id
/// issued before it, which is what makes re-registration safe.
///
/// # Examples
///
/// ```rust
/// use zelect_core::SequenceId;
///
/// let first = SequenceId::new(3);
/// let later = SequenceId::new(7);
/// assert!(later > first);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub u64);

impl SequenceId {
    /// Creates a sequence id with the given value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value of this sequence id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One candidate's registration under the election path.
///
/// Entries are created by [`create_ephemeral_sequential`] and never mutated
/// afterwards; the coordination service removes them when the owning session
/// ends. The `owner` is populated only where the entry's payload has actually
/// been read (always for this instance's own entry, usually not for siblings
/// seen through a plain child listing).
///
/// [`create_ephemeral_sequential`]: crate::coordination::CoordinationSession::create_ephemeral_sequential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionEntry {
    /// Sequence number assigned by the coordination service
    pub sequence_id: SequenceId,
    /// Full path of the entry under the election namespace
    pub path: String,
    /// Owning instance, when known (observability only)
    pub owner: Option<InstanceId>,
}

impl ElectionEntry {
    /// Creates an entry with an unknown owner, as produced by a child listing.
    pub fn unowned(sequence_id: SequenceId, path: impl Into<String>) -> Self {
        Self {
            sequence_id,
            path: path.into(),
            owner: None,
        }
    }

    /// Creates an entry owned by the given instance.
    pub fn owned(sequence_id: SequenceId, path: impl Into<String>, owner: InstanceId) -> Self {
        Self {
            sequence_id,
            path: path.into(),
            owner: Some(owner),
        }
    }
}

impl fmt::Display for ElectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.path, self.sequence_id)
    }
}

/// An ordered view of every live registration at one point in time.
///
/// Snapshots are always rebuilt in full from a fresh child listing and never
/// patched incrementally, so a missed notification can never leave a stale
/// entry behind. Construction sorts ascending by sequence id.
///
/// # Examples
///
/// ```rust
/// use zelect_core::{ElectionEntry, ElectionSnapshot, SequenceId};
///
/// let snapshot = ElectionSnapshot::new(vec![
///     ElectionEntry::unowned(SequenceId::new(5), "/election/candidate_0000000005"),
///     ElectionEntry::unowned(SequenceId::new(2), "/election/candidate_0000000002"),
/// ]);
/// assert_eq!(snapshot.head().unwrap().sequence_id, SequenceId::new(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElectionSnapshot {
    entries: Vec<ElectionEntry>,
}

impl ElectionSnapshot {
    /// Builds a snapshot from an unordered listing, sorting ascending by
    /// sequence id.
    pub fn new(mut entries: Vec<ElectionEntry>) -> Self {
        entries.sort_by_key(|e| e.sequence_id);
        Self { entries }
    }

    /// Entries in ascending sequence order.
    pub fn entries(&self) -> &[ElectionEntry] {
        &self.entries
    }

    /// The entry with the smallest sequence id, i.e. the current leader.
    pub fn head(&self) -> Option<&ElectionEntry> {
        self.entries.first()
    }

    /// Whether an entry with the given sequence id is present.
    pub fn contains(&self, sequence_id: SequenceId) -> bool {
        self.entries
            .binary_search_by_key(&sequence_id, |e| e.sequence_id)
            .is_ok()
    }

    /// The entry with the largest sequence id strictly below `sequence_id`.
    pub fn predecessor_of(&self, sequence_id: SequenceId) -> Option<&ElectionEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.sequence_id < sequence_id)
    }

    /// First duplicated sequence id, if the listing violated uniqueness.
    pub fn first_duplicate(&self) -> Option<SequenceId> {
        self.entries
            .windows(2)
            .find(|w| w[0].sequence_id == w[1].sequence_id)
            .map(|w| w[0].sequence_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Role of this instance in the election, owned solely by the state machine.
///
/// The role is derived from the latest snapshot, this instance's own sequence
/// id, and the session state; client code observes it but never assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Not yet connected to the coordination service
    Unknown,
    /// Connected; registration or re-evaluation in progress
    Registering,
    /// This instance holds leadership
    Leader,
    /// Another instance leads; a predecessor watch is armed
    Follower,
    /// Session transiently lost; previous role suspended, not cleared
    Disconnected,
    /// Terminal: shut down or failed without recovery
    Closed,
}

impl Role {
    /// Whether the state machine has reached its terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Role::Closed)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unknown => write!(f, "Unknown"),
            Role::Registering => write!(f, "Registering"),
            Role::Leader => write!(f, "Leader"),
            Role::Follower => write!(f, "Follower"),
            Role::Disconnected => write!(f, "Disconnected"),
            Role::Closed => write!(f, "Closed"),
        }
    }
}

/// Session-level state reported by the coordination service.
///
/// `Disconnected` and `Expired` are deliberately distinct: ephemeral entries
/// survive a transient disconnection but are destroyed on expiry, so the two
/// must never be collapsed into one "lost" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Heartbeats missed; the session may still recover
    Disconnected,
    /// Session established or re-established
    Connected,
    /// Session destroyed by the service; all ephemeral entries are gone
    Expired,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Connected => write!(f, "Connected"),
            SessionState::Expired => write!(f, "Expired"),
        }
    }
}

/// Payload written into an election entry at registration time.
///
/// Read back only for observability and debugging; the ordering decision
/// never consults it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    /// Owning instance identifier
    pub instance: InstanceId,
    /// Unique id of this registration attempt
    pub registration_id: Uuid,
    /// Creation time, milliseconds since the Unix epoch
    pub created_at_ms: u64,
}

impl EntryPayload {
    /// Creates a payload for a fresh registration attempt.
    pub fn new(instance: InstanceId) -> Self {
        Self {
            instance,
            registration_id: Uuid::new_v4(),
            created_at_ms: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seq: u64) -> ElectionEntry {
        ElectionEntry::unowned(SequenceId::new(seq), format!("/election/candidate_{seq:010}"))
    }

    #[test]
    fn snapshot_sorts_on_construction() {
        let snapshot = ElectionSnapshot::new(vec![entry(9), entry(1), entry(4)]);
        let ids: Vec<u64> = snapshot
            .entries()
            .iter()
            .map(|e| e.sequence_id.value())
            .collect();
        assert_eq!(ids, vec![1, 4, 9]);
        assert_eq!(snapshot.head().unwrap().sequence_id, SequenceId::new(1));
    }

    #[test]
    fn predecessor_is_largest_below() {
        // Gaps from deleted entries are the normal case.
        let snapshot = ElectionSnapshot::new(vec![entry(2), entry(5), entry(11)]);
        assert_eq!(
            snapshot.predecessor_of(SequenceId::new(11)).unwrap().sequence_id,
            SequenceId::new(5)
        );
        assert_eq!(
            snapshot.predecessor_of(SequenceId::new(5)).unwrap().sequence_id,
            SequenceId::new(2)
        );
        assert!(snapshot.predecessor_of(SequenceId::new(2)).is_none());
    }

    #[test]
    fn duplicate_detection() {
        let snapshot = ElectionSnapshot::new(vec![entry(3), entry(3), entry(7)]);
        assert_eq!(snapshot.first_duplicate(), Some(SequenceId::new(3)));

        let clean = ElectionSnapshot::new(vec![entry(3), entry(7)]);
        assert_eq!(clean.first_duplicate(), None);
    }

    #[test]
    fn contains_uses_sorted_order() {
        let snapshot = ElectionSnapshot::new(vec![entry(8), entry(2)]);
        assert!(snapshot.contains(SequenceId::new(8)));
        assert!(!snapshot.contains(SequenceId::new(5)));
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = EntryPayload::new(InstanceId::new("host-1:77"));
        let bytes = serde_json::to_vec(&payload).unwrap();
        let back: EntryPayload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, payload);
    }
}
