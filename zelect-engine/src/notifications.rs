//! Leadership change notifications.
//!
//! The bus is the sole channel through which callers learn about leadership:
//! `Acquired` and `Lost` fire exactly once per transition into and out of the
//! leader role, and unrecoverable failures surface as `Terminated` with an
//! explicit reason rather than a panic inside an asynchronous context.

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;
use zelect_core::{ElectionEntry, SequenceId};

/// A leadership-related notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadershipEvent {
    /// This instance became the leader
    Acquired {
        /// Path of the winning election entry
        path: String,
        /// Sequence id of the winning entry
        sequence_id: SequenceId,
    },

    /// This instance stopped being the leader
    Lost { reason: String },

    /// The state machine terminated without recovery
    Terminated { reason: String },
}

/// Fan-out bus for [`LeadershipEvent`] values.
///
/// Scaled-down broadcast: every subscriber gets its own unbounded channel and
/// receives every event; closed receivers are pruned on the next notify.
#[derive(Debug, Default)]
pub struct LeadershipBus {
    subscribers: RwLock<Vec<mpsc::UnboundedSender<LeadershipEvent>>>,
}

impl LeadershipBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer; events published after this call are delivered
    /// in order on the returned receiver.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LeadershipEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn notify(&self, event: LeadershipEvent) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!(?event, delivered = subscribers.len(), "published leadership event");
    }

    pub fn acquired(&self, entry: &ElectionEntry) {
        self.notify(LeadershipEvent::Acquired {
            path: entry.path.clone(),
            sequence_id: entry.sequence_id,
        });
    }

    pub fn lost(&self, reason: impl Into<String>) {
        self.notify(LeadershipEvent::Lost {
            reason: reason.into(),
        });
    }

    pub fn terminated(&self, reason: impl Into<String>) {
        self.notify(LeadershipEvent::Terminated {
            reason: reason.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zelect_core::InstanceId;

    fn entry() -> ElectionEntry {
        ElectionEntry::owned(
            SequenceId::new(3),
            "/election/candidate_0000000003",
            InstanceId::new("a"),
        )
    }

    #[tokio::test]
    async fn events_reach_every_subscriber_in_order() {
        let bus = LeadershipBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.acquired(&entry());
        bus.lost("superseded");

        for rx in [&mut rx1, &mut rx2] {
            assert!(matches!(
                rx.recv().await.unwrap(),
                LeadershipEvent::Acquired { .. }
            ));
            assert_eq!(
                rx.recv().await.unwrap(),
                LeadershipEvent::Lost {
                    reason: "superseded".to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = LeadershipBus::new();
        let rx = bus.subscribe();
        let _rx2 = bus.subscribe();
        drop(rx);

        bus.terminated("corrupted state");
        assert_eq!(bus.subscriber_count(), 1);
    }
}
