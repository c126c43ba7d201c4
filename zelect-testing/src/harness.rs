//! Scenario harness for election tests.
//!
//! Wraps the engine's public surface so scenarios read as intent: spawn
//! candidates against one simulated cluster, wait for roles, and drive
//! session faults by candidate.
//!
//! Leadership events are subscribed before the engine task gets a chance to
//! run, so tests on a current-thread runtime observe every `Acquired`/`Lost`
//! from the very first transition.

use crate::{SessionId, SimCluster, SimConnector};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use zelect_core::Role;
use zelect_engine::{start, ElectionConfig, ElectionHandle, LeadershipEvent};

/// One spawned candidate and its test-side handles.
pub struct Candidate {
    pub handle: ElectionHandle,
    pub connector: SimConnector,
    pub events: mpsc::UnboundedReceiver<LeadershipEvent>,
}

impl Candidate {
    /// Id of the candidate's current session.
    ///
    /// # Panics
    ///
    /// Panics if the candidate has not connected yet.
    pub fn session_id(&self) -> SessionId {
        self.connector
            .session_id()
            .expect("candidate has not connected")
    }

    /// Next leadership event, or `None` if none arrives within `wait`.
    pub async fn next_event(&mut self, wait: Duration) -> Option<LeadershipEvent> {
        timeout(wait, self.events.recv()).await.ok().flatten()
    }
}

/// Starts an election participant against the simulated cluster.
pub fn spawn_candidate(cluster: &SimCluster, election_path: &str, instance: &str) -> Candidate {
    let connector = cluster.connector();
    let config = ElectionConfig::new(election_path, instance)
        .with_address("sim")
        .with_session_timeout(Duration::from_millis(500));
    let handle = start(config, connector.clone());
    let events = handle.subscribe();
    Candidate {
        handle,
        connector,
        events,
    }
}

/// Waits until the candidate reports `role`, up to `wait`.
pub async fn wait_for_role(handle: &ElectionHandle, role: Role, wait: Duration) -> bool {
    let mut updates = handle.role_updates();
    let reached = matches!(
        timeout(wait, updates.wait_for(|current| *current == role)).await,
        Ok(Ok(_))
    );
    reached
}
