//! Session failure scenarios: transient disconnection versus expiry.
//!
//! The distinction is load-bearing: ephemeral entries survive a disconnect
//! (the role is suspended, never re-registered), while expiry destroys the
//! entry and forces a fresh registration under a strictly larger sequence id.

use std::time::Duration;
use zelect_core::Role;
use zelect_engine::LeadershipEvent;
use zelect_testing::{spawn_candidate, wait_for_role, SimCluster};

const WAIT: Duration = Duration::from_secs(2);
const SETTLE: Duration = Duration::from_millis(100);

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..40 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn disconnect_then_reconnect_keeps_role_without_re_registration() {
    init_logging();
    let cluster = SimCluster::new();

    let mut a = spawn_candidate(&cluster, "/election", "a");
    assert!(wait_for_role(&a.handle, Role::Leader, WAIT).await);
    assert!(matches!(
        a.next_event(WAIT).await,
        Some(LeadershipEvent::Acquired { .. })
    ));

    let b = spawn_candidate(&cluster, "/election", "b");
    assert!(wait_for_role(&b.handle, Role::Follower, WAIT).await);

    let session = a.session_id();
    cluster.disconnect_session(session);
    assert!(wait_for_role(&a.handle, Role::Disconnected, WAIT).await);

    // Suspended, not cleared: the ephemeral entry survives the disconnect.
    assert_eq!(cluster.sequence_ids("/election"), vec![0, 1]);

    cluster.reconnect_session(session);
    assert!(wait_for_role(&a.handle, Role::Leader, WAIT).await);

    // Same session, same entry, and no duplicate Acquired.
    assert_eq!(a.session_id(), session);
    assert_eq!(cluster.sequence_ids("/election"), vec![0, 1]);
    assert!(a.next_event(SETTLE).await.is_none());

    a.handle.shutdown().await;
    b.handle.shutdown().await;
}

#[tokio::test]
async fn leader_expiry_loses_leadership_and_rejoins_with_larger_sequence() {
    init_logging();
    let cluster = SimCluster::new();

    let mut a = spawn_candidate(&cluster, "/election", "a");
    assert!(wait_for_role(&a.handle, Role::Leader, WAIT).await);
    assert!(matches!(
        a.next_event(WAIT).await,
        Some(LeadershipEvent::Acquired { .. })
    ));

    let mut b = spawn_candidate(&cluster, "/election", "b");
    assert!(wait_for_role(&b.handle, Role::Follower, WAIT).await);

    let first_session = a.session_id();
    cluster.expire_session(first_session);

    // The loss is genuine, not a bug: the claim died with the session.
    assert_eq!(
        a.next_event(WAIT).await,
        Some(LeadershipEvent::Lost {
            reason: "session expired".to_string()
        })
    );

    // B's predecessor watch fires and B takes over.
    assert!(wait_for_role(&b.handle, Role::Leader, WAIT).await);
    assert!(matches!(
        b.next_event(WAIT).await,
        Some(LeadershipEvent::Acquired { .. })
    ));

    // A re-registers on a fresh session; the new sequence id is strictly
    // greater than every id issued before the expiry.
    assert!(wait_for_role(&a.handle, Role::Follower, WAIT).await);
    assert_ne!(a.session_id(), first_session);
    assert_eq!(cluster.sequence_ids("/election"), vec![1, 2]);

    a.handle.shutdown().await;
    b.handle.shutdown().await;
}

#[tokio::test]
async fn follower_expiry_re_registers_behind_the_leader() {
    init_logging();
    let cluster = SimCluster::new();

    let a = spawn_candidate(&cluster, "/election", "a");
    assert!(wait_for_role(&a.handle, Role::Leader, WAIT).await);

    let mut b = spawn_candidate(&cluster, "/election", "b");
    assert!(wait_for_role(&b.handle, Role::Follower, WAIT).await);

    cluster.expire_session(b.session_id());

    // B's old entry (1) is reaped and replaced by a fresh one (2).
    assert!(eventually(|| cluster.sequence_ids("/election") == vec![0, 2]).await);
    assert!(wait_for_role(&b.handle, Role::Follower, WAIT).await);

    // The leader never noticed; B never held leadership, so no Lost fires.
    assert_eq!(a.handle.current_role(), Role::Leader);
    assert!(b.next_event(SETTLE).await.is_none());

    a.handle.shutdown().await;
    b.handle.shutdown().await;
}
