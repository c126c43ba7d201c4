//! # Coordination Service Abstraction
//!
//! Trait seam between the election core and the ZooKeeper-like coordination
//! service it consumes. The core never implements the service; it relies on
//! the service's guarantees: ephemeral entries, monotonically assigned
//! sequence numbers per parent path, one-shot watches, and in-order event
//! delivery per session.
//!
//! Every asynchronous notification (session-level and watch-level alike)
//! arrives as a [`CoordinationEvent`] on a single channel per session, so the
//! state machine can process events strictly one at a time in arrival order.

use crate::{Result, SequenceId, SessionState};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// A change notification from a previously armed one-shot watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The watched entry was deleted
    NodeDeleted(String),
    /// The children of the watched path changed
    NodeChildrenChanged(String),
}

/// Tagged union of everything the service can report asynchronously.
///
/// Session events and watch events share one stream; consumers must not
/// assume deduplication, only per-session ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinationEvent {
    Session(SessionState),
    Watch(WatchEvent),
}

/// Receiving half of a session's event stream: lazy, infinite, and
/// non-restartable.
pub type EventReceiver = mpsc::UnboundedReceiver<CoordinationEvent>;

/// One child of an election path as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Name of the child, relative to the listed path
    pub name: String,
    /// Sequence suffix assigned at creation
    pub sequence_id: SequenceId,
}

/// Establishes sessions against the coordination service.
///
/// Separated from [`CoordinationSession`] because session expiry destroys the
/// session object itself; recovering from expiry means connecting again and
/// obtaining a brand-new session with a fresh event stream.
#[async_trait]
pub trait CoordinationConnector: Send + Sync + 'static {
    type Session: CoordinationSession;

    /// Opens a session, returning the handle and its event stream.
    ///
    /// The first event on the stream is the initial
    /// [`SessionState::Connected`] transition. Fails with
    /// [`ElectionError::Connection`] for unreachable or malformed addresses.
    ///
    /// [`ElectionError::Connection`]: crate::ElectionError::Connection
    async fn connect(
        &self,
        address: &str,
        session_timeout: Duration,
    ) -> Result<(Self::Session, EventReceiver)>;
}

/// A live session against the coordination service.
///
/// While connected, the service maintains liveness itself (heartbeats); the
/// core only reacts to the three [`SessionState`] transitions delivered on
/// the event stream.
#[async_trait]
pub trait CoordinationSession: Send + Sync + 'static {
    /// Creates an ephemeral entry with a service-assigned sequence suffix.
    ///
    /// Returns the full path of the created entry and its sequence id. The
    /// entry lives exactly as long as this session.
    async fn create_ephemeral_sequential(
        &self,
        path_prefix: &str,
        payload: &[u8],
    ) -> Result<(String, SequenceId)>;

    /// Lists the children of `path`, optionally arming a one-shot
    /// children-changed watch.
    async fn get_children(&self, path: &str, watch: bool) -> Result<Vec<ChildEntry>>;

    /// Checks whether `path` exists, optionally arming a one-shot deletion
    /// watch on it. No watch is armed when the node is already absent.
    async fn exists(&self, path: &str, watch: bool) -> Result<bool>;

    /// Deletes the entry at `path`. Best-effort on shutdown.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Scoped release: closes the session, removing every ephemeral entry it
    /// owns. Idempotent.
    async fn close(&self) -> Result<()>;
}
