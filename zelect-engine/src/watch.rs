//! Predecessor watch management.
//!
//! The coordination service's watches are one-shot, so a fresh watch must be
//! armed after every snapshot refresh; nothing here assumes a watch persists
//! across re-evaluation. At most one watch is considered armed at a time:
//! the current predecessor's path, or none while leading.

use tracing::debug;
use zelect_core::{CoordinationSession, Result, WatchEvent};

/// Arms deletion watches and translates raw watch events into the single
/// signal the state machine cares about: the armed predecessor is gone.
#[derive(Debug, Default)]
pub struct WatchDispatcher {
    armed: Option<String>,
}

impl WatchDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path currently considered armed, if any.
    pub fn armed_path(&self) -> Option<&str> {
        self.armed.as_deref()
    }

    /// Arms a one-shot deletion watch on `path`.
    ///
    /// Returns `false` when the node is already gone (the race between
    /// listing the children and arming the watch), in which case no watch is
    /// armed and the caller must re-evaluate from a fresh snapshot.
    pub async fn arm<S: CoordinationSession>(&mut self, session: &S, path: &str) -> Result<bool> {
        if session.exists(path, true).await? {
            debug!(%path, "armed predecessor watch");
            self.armed = Some(path.to_string());
            Ok(true)
        } else {
            self.armed = None;
            Ok(false)
        }
    }

    /// Forgets the armed watch without touching the service. Used when
    /// becoming leader and on reset; a previously armed server-side watch may
    /// still fire later and will be dropped as stale.
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Consumes a raw watch event, returning the predecessor path when the
    /// armed entry was deleted. Deletions of non-armed paths are stale
    /// leftovers from earlier arming rounds and are dropped; children-changed
    /// events carry no information the next full listing will not.
    pub fn predecessor_gone(&mut self, event: &WatchEvent) -> Option<String> {
        match event {
            WatchEvent::NodeDeleted(path) if self.armed.as_deref() == Some(path.as_str()) => {
                self.armed.take()
            }
            WatchEvent::NodeDeleted(path) => {
                debug!(%path, "ignoring stale deletion event");
                None
            }
            WatchEvent::NodeChildrenChanged(_) => None,
        }
    }
}
