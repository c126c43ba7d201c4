//! The election state machine.
//!
//! One tokio task owns the whole election lifecycle for an instance: it
//! drives the registrar, evaluator, and watch dispatcher, and processes the
//! session's coordination events strictly one at a time in arrival order, so
//! no transition ever observes a half-updated snapshot.
//!
//! State transitions:
//!
//! ```text
//! Unknown --connect--> Registering --entry created--> {Leader, Follower}
//! Leader/Follower --session Disconnected--> Disconnected (role suspended)
//! Disconnected --session Connected--> re-evaluate (entry survived)
//! any --session Expired--> re-register from scratch (new sequence id)
//! any --shutdown--> Closed (terminal)
//! ```

use crate::{ElectionConfig, LeadershipBus, LeadershipEvent, Registrar, WatchDispatcher};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zelect_core::{
    evaluate, CoordinationConnector, CoordinationEvent, CoordinationSession, ElectionEntry,
    ElectionError, ElectionSnapshot, EventReceiver, Result, Role, SessionState,
};

/// Commands accepted by a running election engine.
#[derive(Debug)]
pub enum EngineCommand {
    /// Release the session and stop; acknowledged once the terminal state is
    /// reached.
    Shutdown(oneshot::Sender<()>),
}

enum Input {
    Command(Option<EngineCommand>),
    Event(Option<CoordinationEvent>),
}

/// Begins the election state machine for one candidate instance.
///
/// Spawns the engine task on the current tokio runtime and returns the handle
/// through which the role is observed and shutdown is requested. Connection
/// failures do not surface here: they terminate the state machine and are
/// reported as [`LeadershipEvent::Terminated`] to subscribers.
pub fn start<C: CoordinationConnector>(config: ElectionConfig, connector: C) -> ElectionHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (role_tx, role_rx) = watch::channel(Role::Unknown);
    let bus = Arc::new(LeadershipBus::new());

    let engine = ElectionEngine {
        registrar: Registrar::new(config.election_path.clone(), config.instance_id.clone()),
        dispatcher: WatchDispatcher::new(),
        config,
        connector,
        session: None,
        events: None,
        cmd_rx,
        role_tx,
        bus: Arc::clone(&bus),
        holds_leadership: false,
    };

    let task = tokio::spawn(engine.run());

    ElectionHandle {
        cmd_tx,
        role_rx,
        bus,
        task: Mutex::new(Some(task)),
    }
}

/// Caller-facing handle to a running election.
///
/// The handle never mutates election state directly; the role is owned by
/// the engine task and only observed here.
pub struct ElectionHandle {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
    role_rx: watch::Receiver<Role>,
    bus: Arc<LeadershipBus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ElectionHandle {
    /// Point-in-time snapshot of the current role. Non-blocking; two reads
    /// with no intervening event return the same value.
    pub fn current_role(&self) -> Role {
        *self.role_rx.borrow()
    }

    /// Whether this instance currently holds leadership.
    pub fn is_leader(&self) -> bool {
        self.current_role() == Role::Leader
    }

    /// A watch receiver tracking every role transition.
    pub fn role_updates(&self) -> watch::Receiver<Role> {
        self.role_rx.clone()
    }

    /// Subscribes to leadership notifications: `Acquired` and `Lost` fire
    /// exactly once per transition into and out of `Leader`; fatal failures
    /// arrive as `Terminated`.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LeadershipEvent> {
        self.bus.subscribe()
    }

    /// Scoped release: requests shutdown and blocks until the session is
    /// closed and the terminal state reached. Idempotent.
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(EngineCommand::Shutdown(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }
    }
}

struct ElectionEngine<C: CoordinationConnector> {
    config: ElectionConfig,
    connector: C,
    session: Option<C::Session>,
    events: Option<EventReceiver>,
    registrar: Registrar,
    dispatcher: WatchDispatcher,
    cmd_rx: mpsc::UnboundedReceiver<EngineCommand>,
    role_tx: watch::Sender<Role>,
    bus: Arc<LeadershipBus>,
    holds_leadership: bool,
}

impl<C: CoordinationConnector> ElectionEngine<C> {
    async fn run(mut self) {
        info!(
            instance = %self.config.instance_id,
            election_path = %self.config.election_path,
            "starting election state machine"
        );

        if let Err(e) = self.connect().await {
            self.terminate(format!("connect failed: {e}")).await;
            return;
        }

        loop {
            let input = match self.events.as_mut() {
                Some(events) => tokio::select! {
                    command = self.cmd_rx.recv() => Input::Command(command),
                    event = events.recv() => Input::Event(event),
                },
                None => Input::Event(None),
            };

            match input {
                Input::Command(Some(EngineCommand::Shutdown(ack))) => {
                    self.handle_shutdown().await;
                    let _ = ack.send(());
                    break;
                }
                Input::Command(None) => {
                    // Every handle dropped: release the session and stop.
                    self.handle_shutdown().await;
                    break;
                }
                Input::Event(None) => {
                    self.terminate("coordination event stream closed".to_string())
                        .await;
                    break;
                }
                Input::Event(Some(event)) => {
                    if let Err(e) = self.handle_event(event).await {
                        if e.is_transient() {
                            warn!(error = %e, "transient coordination failure, suspending");
                            self.suspend();
                        } else if e.is_session_fatal() {
                            if let Err(e) = self.handle_expiry().await {
                                self.terminate(format!(
                                    "re-registration after expiry failed: {e}"
                                ))
                                .await;
                                break;
                            }
                        } else {
                            self.terminate(e.to_string()).await;
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_event(&mut self, event: CoordinationEvent) -> Result<()> {
        match event {
            CoordinationEvent::Session(SessionState::Connected) => self.on_connected().await,
            CoordinationEvent::Session(SessionState::Disconnected) => {
                self.suspend();
                Ok(())
            }
            // Expiry is absolute: anything armed or in flight before it is
            // void. Routed through the error path so in-progress work above
            // this frame is abandoned the same way.
            CoordinationEvent::Session(SessionState::Expired) => Err(ElectionError::SessionExpired),
            CoordinationEvent::Watch(watch_event) => {
                if let Some(path) = self.dispatcher.predecessor_gone(&watch_event) {
                    info!(predecessor = %path, "predecessor gone, re-evaluating");
                    self.evaluate_and_arm().await
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn on_connected(&mut self) -> Result<()> {
        if self.registrar.current().is_none() {
            info!("session connected, registering candidacy");
            self.set_role(Role::Registering);
            let session = self
                .session
                .as_ref()
                .ok_or_else(|| ElectionError::internal("connected without a session"))?;
            self.registrar.register(session).await?;
        } else {
            // Reconnected within the session timeout: the ephemeral entry
            // survived, so no re-registration. Re-derive the role in full.
            debug!("session reconnected, re-evaluating from a fresh snapshot");
        }
        self.evaluate_and_arm().await
    }

    /// Fetches a fresh snapshot, evaluates it, and arms the predecessor
    /// watch. Loops when the chosen predecessor vanished between the listing
    /// and the arming, so an armed watch or leadership always results.
    async fn evaluate_and_arm(&mut self) -> Result<()> {
        loop {
            let my_sequence_id = self
                .registrar
                .current()
                .ok_or_else(|| ElectionError::internal("evaluation without a registration"))?
                .sequence_id;

            let session = self
                .session
                .as_ref()
                .ok_or_else(|| ElectionError::internal("evaluation without a session"))?;

            let children = session
                .get_children(&self.config.election_path, false)
                .await?;
            let snapshot = ElectionSnapshot::new(
                children
                    .into_iter()
                    .map(|child| {
                        ElectionEntry::unowned(
                            child.sequence_id,
                            format!("{}/{}", self.config.election_path, child.name),
                        )
                    })
                    .collect(),
            );
            debug!(candidates = snapshot.len(), %my_sequence_id, "evaluating election snapshot");

            let evaluation = evaluate(&snapshot, my_sequence_id)?;
            match evaluation.role {
                Role::Leader => {
                    self.dispatcher.disarm();
                    self.become_leader();
                    return Ok(());
                }
                Role::Follower => {
                    let target = evaluation.watch_target.ok_or_else(|| {
                        ElectionError::internal("follower evaluation without a watch target")
                    })?;
                    if self.dispatcher.arm(session, &target.path).await? {
                        self.become_follower(&target);
                        return Ok(());
                    }
                    debug!(predecessor = %target.path, "predecessor vanished before watch armed, retrying");
                }
                other => {
                    return Err(ElectionError::internal(format!(
                        "evaluator produced unexpected role {other}"
                    )))
                }
            }
        }
    }

    fn become_leader(&mut self) {
        let entry = self.registrar.current().cloned();
        self.set_role(Role::Leader);
        if !self.holds_leadership {
            self.holds_leadership = true;
            if let Some(entry) = entry {
                info!(entry = %entry, "leadership acquired");
                self.bus.acquired(&entry);
            }
        }
    }

    fn become_follower(&mut self, target: &ElectionEntry) {
        if self.holds_leadership {
            self.holds_leadership = false;
            self.bus
                .lost("superseded by an entry with a smaller sequence id");
        }
        self.set_role(Role::Follower);
        debug!(watching = %target.path, "following");
    }

    /// Transient disconnection: the role is suspended, not cleared. The
    /// ephemeral entry survives, so leadership is not assumed lost yet.
    fn suspend(&mut self) {
        self.set_role(Role::Disconnected);
    }

    /// Session expiry: the entry is gone and any leadership held was
    /// genuinely lost. Connects a fresh session and restarts registration;
    /// the new sequence id will be strictly larger than all earlier ones.
    async fn handle_expiry(&mut self) -> Result<()> {
        warn!("session expired, candidacy lost, re-registering from scratch");
        self.dispatcher.disarm();
        self.registrar.reset();
        if self.holds_leadership {
            self.holds_leadership = false;
            self.bus.lost("session expired");
        }
        if let Some(old) = self.session.take() {
            let _ = old.close().await;
        }
        self.events = None;
        self.set_role(Role::Registering);
        self.connect().await
    }

    async fn handle_shutdown(&mut self) {
        info!("shutdown requested, releasing session");
        if self.holds_leadership {
            self.holds_leadership = false;
            self.bus.lost("shutdown");
        }
        self.dispatcher.disarm();
        if let Some(session) = self.session.take() {
            self.registrar.resign(&session).await;
            if let Err(e) = session.close().await {
                debug!(error = %e, "session close reported an error");
            }
        }
        self.set_role(Role::Closed);
    }

    async fn terminate(&mut self, reason: String) {
        error!(%reason, "election state machine terminating");
        if self.holds_leadership {
            self.holds_leadership = false;
            self.bus.lost(reason.clone());
        }
        self.dispatcher.disarm();
        if let Some(session) = self.session.take() {
            let _ = session.close().await;
        }
        self.bus.terminated(reason);
        self.set_role(Role::Closed);
    }

    async fn connect(&mut self) -> Result<()> {
        debug!(address = %self.config.address, "connecting to coordination service");
        let connecting = self
            .connector
            .connect(&self.config.address, self.config.session_timeout);
        let (session, events) = tokio::time::timeout(self.config.connect_timeout, connecting)
            .await
            .map_err(|_| ElectionError::timeout("connect"))??;
        self.session = Some(session);
        self.events = Some(events);
        Ok(())
    }

    fn set_role(&mut self, role: Role) {
        let previous = *self.role_tx.borrow();
        if previous != role {
            info!(from = %previous, to = %role, "role transition");
        }
        self.role_tx.send_replace(role);
    }
}
