//! In-memory coordination service.
//!
//! Implements the `zelect-core` coordination traits with the semantics the
//! election core relies on: per-parent monotonic sequence counters, ephemeral
//! entries reaped when their owning session ends, one-shot deletion and
//! children watches, and in-order event delivery per session. Namespace
//! parents are implicit; listing a path with no children returns an empty
//! set rather than `NoNode`.
//!
//! Fault controls (`disconnect_session`, `reconnect_session`,
//! `expire_session`) drive the failure scenarios deterministically:
//! disconnection keeps ephemerals and the session alive, expiry destroys
//! both.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;
use zelect_core::{
    ChildEntry, CoordinationConnector, CoordinationEvent, CoordinationSession, ElectionError,
    EventReceiver, Result, SequenceId, SessionState, WatchEvent,
};

/// Identifier of one simulated session.
pub type SessionId = Uuid;

/// Handle to the simulated coordination service, shared by every connector
/// and session created from it.
#[derive(Debug, Clone, Default)]
pub struct SimCluster {
    state: Arc<SimState>,
}

#[derive(Debug, Default)]
struct SimState {
    inner: Mutex<SimInner>,
}

#[derive(Debug, Default)]
struct SimInner {
    // BTreeMap keeps listings deterministic.
    nodes: BTreeMap<String, SimNode>,
    counters: HashMap<String, u64>,
    sessions: HashMap<SessionId, SimSessionRecord>,
}

#[derive(Debug)]
struct SimNode {
    #[allow(dead_code)]
    payload: Vec<u8>,
    owner: SessionId,
    sequence_id: SequenceId,
}

#[derive(Debug)]
struct SimSessionRecord {
    events: mpsc::UnboundedSender<CoordinationEvent>,
    alive: bool,
    connected: bool,
    deletion_watches: HashSet<String>,
    child_watches: HashSet<String>,
}

impl SimCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector for one candidate; clone it to keep a test-side handle to
    /// the session id the engine establishes (and re-establishes on expiry).
    pub fn connector(&self) -> SimConnector {
        SimConnector {
            state: Arc::clone(&self.state),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Simulates missed heartbeats: the session stops reaching the service
    /// but stays alive, so its ephemeral entries survive.
    pub fn disconnect_session(&self, id: SessionId) {
        let mut inner = self.state.inner.lock();
        if let Some(session) = inner.sessions.get_mut(&id) {
            if session.alive && session.connected {
                session.connected = false;
                let _ = session
                    .events
                    .send(CoordinationEvent::Session(SessionState::Disconnected));
            }
        }
    }

    /// The session reaches the service again before the timeout: same
    /// session, ephemeral entries preserved.
    pub fn reconnect_session(&self, id: SessionId) {
        let mut inner = self.state.inner.lock();
        if let Some(session) = inner.sessions.get_mut(&id) {
            if session.alive && !session.connected {
                session.connected = true;
                let _ = session
                    .events
                    .send(CoordinationEvent::Session(SessionState::Connected));
            }
        }
    }

    /// Unilateral session termination: every ephemeral entry the session
    /// owns is destroyed (firing other sessions' watches) and the session
    /// receives `Expired` as its final event.
    pub fn expire_session(&self, id: SessionId) {
        let mut inner = self.state.inner.lock();
        let Some(session) = inner.sessions.get_mut(&id) else {
            return;
        };
        if !session.alive {
            return;
        }
        session.alive = false;
        session.connected = false;
        let events = session.events.clone();

        reap_ephemerals(&mut inner, id);
        let _ = events.send(CoordinationEvent::Session(SessionState::Expired));
        debug!(session = %id, "session expired");
    }

    /// Whether a node exists at `path`. Test assertions only.
    pub fn node_exists(&self, path: &str) -> bool {
        self.state.inner.lock().nodes.contains_key(path)
    }

    /// Sequence ids of the children under `path`, ascending. Test assertions
    /// only.
    pub fn sequence_ids(&self, path: &str) -> Vec<u64> {
        let inner = self.state.inner.lock();
        let prefix = format!("{path}/");
        let mut ids: Vec<u64> = inner
            .nodes
            .iter()
            .filter(|(p, _)| p.starts_with(&prefix) && !p[prefix.len()..].contains('/'))
            .map(|(_, node)| node.sequence_id.value())
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Connects sessions against one [`SimCluster`].
#[derive(Debug, Clone)]
pub struct SimConnector {
    state: Arc<SimState>,
    current: Arc<Mutex<Option<SessionId>>>,
}

impl SimConnector {
    /// Id of the most recently established session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        *self.current.lock()
    }
}

#[async_trait]
impl CoordinationConnector for SimConnector {
    type Session = SimSession;

    async fn connect(
        &self,
        address: &str,
        _session_timeout: Duration,
    ) -> Result<(SimSession, EventReceiver)> {
        if address.is_empty() {
            return Err(ElectionError::connection("empty coordination address"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        {
            let mut inner = self.state.inner.lock();
            inner.sessions.insert(
                id,
                SimSessionRecord {
                    events: tx.clone(),
                    alive: true,
                    connected: true,
                    deletion_watches: HashSet::new(),
                    child_watches: HashSet::new(),
                },
            );
        }
        let _ = tx.send(CoordinationEvent::Session(SessionState::Connected));
        *self.current.lock() = Some(id);
        debug!(session = %id, "session established");

        Ok((
            SimSession {
                id,
                state: Arc::clone(&self.state),
            },
            rx,
        ))
    }
}

/// One live simulated session.
#[derive(Debug)]
pub struct SimSession {
    id: SessionId,
    state: Arc<SimState>,
}

#[async_trait]
impl CoordinationSession for SimSession {
    async fn create_ephemeral_sequential(
        &self,
        path_prefix: &str,
        payload: &[u8],
    ) -> Result<(String, SequenceId)> {
        let mut inner = self.state.inner.lock();
        check_usable(&inner, self.id)?;

        let parent = parent_of(path_prefix).to_string();
        let counter = inner.counters.entry(parent.clone()).or_insert(0);
        let sequence_id = SequenceId::new(*counter);
        *counter += 1;

        let path = format!("{path_prefix}{:010}", sequence_id.value());
        inner.nodes.insert(
            path.clone(),
            SimNode {
                payload: payload.to_vec(),
                owner: self.id,
                sequence_id,
            },
        );
        notify_child_watchers(&mut inner, &parent);

        Ok((path, sequence_id))
    }

    async fn get_children(&self, path: &str, watch: bool) -> Result<Vec<ChildEntry>> {
        let mut inner = self.state.inner.lock();
        check_usable(&inner, self.id)?;

        let prefix = format!("{path}/");
        let children = inner
            .nodes
            .iter()
            .filter(|(p, _)| p.starts_with(&prefix) && !p[prefix.len()..].contains('/'))
            .map(|(p, node)| ChildEntry {
                name: p[prefix.len()..].to_string(),
                sequence_id: node.sequence_id,
            })
            .collect();

        if watch {
            if let Some(session) = inner.sessions.get_mut(&self.id) {
                session.child_watches.insert(path.to_string());
            }
        }
        Ok(children)
    }

    async fn exists(&self, path: &str, watch: bool) -> Result<bool> {
        let mut inner = self.state.inner.lock();
        check_usable(&inner, self.id)?;

        let present = inner.nodes.contains_key(path);
        if present && watch {
            if let Some(session) = inner.sessions.get_mut(&self.id) {
                session.deletion_watches.insert(path.to_string());
            }
        }
        Ok(present)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut inner = self.state.inner.lock();
        check_usable(&inner, self.id)?;

        if !inner.nodes.contains_key(path) {
            return Err(ElectionError::NoNode {
                path: path.to_string(),
            });
        }
        remove_node(&mut inner, path);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut inner = self.state.inner.lock();
        let Some(session) = inner.sessions.get_mut(&self.id) else {
            return Ok(());
        };
        if session.alive {
            session.alive = false;
            session.connected = false;
            reap_ephemerals(&mut inner, self.id);
            debug!(session = %self.id, "session closed");
        }
        Ok(())
    }
}

fn check_usable(inner: &SimInner, id: SessionId) -> Result<()> {
    match inner.sessions.get(&id) {
        None => Err(ElectionError::SessionExpired),
        Some(session) if !session.alive => Err(ElectionError::SessionExpired),
        Some(session) if !session.connected => {
            Err(ElectionError::connection_loss("session disconnected"))
        }
        Some(_) => Ok(()),
    }
}

fn parent_of(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

fn reap_ephemerals(inner: &mut SimInner, owner: SessionId) {
    let owned: Vec<String> = inner
        .nodes
        .iter()
        .filter(|(_, node)| node.owner == owner)
        .map(|(path, _)| path.clone())
        .collect();
    for path in owned {
        remove_node(inner, &path);
    }
}

fn remove_node(inner: &mut SimInner, path: &str) {
    if inner.nodes.remove(path).is_some() {
        notify_deletion_watchers(inner, path);
        let parent = parent_of(path).to_string();
        notify_child_watchers(inner, &parent);
    }
}

fn notify_deletion_watchers(inner: &mut SimInner, path: &str) {
    for session in inner.sessions.values_mut() {
        if session.alive && session.deletion_watches.remove(path) {
            let _ = session.events.send(CoordinationEvent::Watch(WatchEvent::NodeDeleted(
                path.to_string(),
            )));
        }
    }
}

fn notify_child_watchers(inner: &mut SimInner, parent: &str) {
    for session in inner.sessions.values_mut() {
        if session.alive && session.child_watches.remove(parent) {
            let _ = session
                .events
                .send(CoordinationEvent::Watch(WatchEvent::NodeChildrenChanged(
                    parent.to_string(),
                )));
        }
    }
}
