//! Candidacy registration against the coordination service.
//!
//! The registrar creates exactly one ephemeral sequential entry per live
//! session per election attempt and remembers its assigned sequence id.
//! After a session expiry the old entry is implicitly gone; [`Registrar::reset`]
//! clears the local reference so a fresh `register` can obtain a new, strictly
//! larger sequence number.

use tracing::{debug, info, warn};
use zelect_core::{
    CoordinationSession, ElectionEntry, ElectionError, EntryPayload, InstanceId, Result,
};

/// Name prefix for election entries; the service appends the sequence suffix.
pub const CANDIDATE_PREFIX: &str = "candidate_";

/// Creates and tracks this instance's election entry.
#[derive(Debug)]
pub struct Registrar {
    election_path: String,
    instance_id: InstanceId,
    current: Option<ElectionEntry>,
}

impl Registrar {
    pub fn new(election_path: impl Into<String>, instance_id: InstanceId) -> Self {
        Self {
            election_path: election_path.into(),
            instance_id,
            current: None,
        }
    }

    /// The live registration, if one exists.
    pub fn current(&self) -> Option<&ElectionEntry> {
        self.current.as_ref()
    }

    /// Creates this instance's ephemeral sequential entry.
    ///
    /// Calling this again on the same session without an intervening expiry
    /// is a programming error and fails with
    /// [`ElectionError::AlreadyRegistered`]; retrying blindly would risk a
    /// duplicate registration under a second sequence number.
    pub async fn register<S: CoordinationSession>(&mut self, session: &S) -> Result<ElectionEntry> {
        if let Some(entry) = &self.current {
            return Err(ElectionError::AlreadyRegistered {
                path: entry.path.clone(),
            });
        }

        let payload = serde_json::to_vec(&EntryPayload::new(self.instance_id.clone()))?;
        let prefix = format!("{}/{}", self.election_path, CANDIDATE_PREFIX);
        let (path, sequence_id) = session.create_ephemeral_sequential(&prefix, &payload).await?;

        info!(
            instance = %self.instance_id,
            %path,
            %sequence_id,
            "registered election entry"
        );

        let entry = ElectionEntry::owned(sequence_id, path, self.instance_id.clone());
        self.current = Some(entry.clone());
        Ok(entry)
    }

    /// Drops the local entry reference after a session expiry.
    ///
    /// The service already deleted the entry itself; only the bookkeeping is
    /// cleared here so the next `register` is legal.
    pub fn reset(&mut self) -> Option<ElectionEntry> {
        self.current.take()
    }

    /// Best-effort explicit deletion on graceful shutdown.
    ///
    /// The service would reclaim the entry on session close anyway; deleting
    /// it first promotes the successor faster. `NoNode` means someone beat us
    /// to it and is not an error.
    pub async fn resign<S: CoordinationSession>(&mut self, session: &S) {
        let Some(entry) = self.current.take() else {
            return;
        };

        match session.delete(&entry.path).await {
            Ok(()) => debug!(path = %entry.path, "deleted election entry on shutdown"),
            Err(ElectionError::NoNode { .. }) => {
                debug!(path = %entry.path, "election entry already gone")
            }
            Err(e) => warn!(path = %entry.path, error = %e, "failed to delete election entry"),
        }
    }
}
