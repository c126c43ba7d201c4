//! Election scenarios against the in-memory coordination service.
//!
//! These cover the core algorithm end to end: registration ordering,
//! leadership by smallest sequence id, and the predecessor-watch failover
//! cascade.

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

#[tokio::test]
async fn lone_candidate_becomes_leader_immediately() {
    init_logging();
    let cluster = SimCluster::new();

    let mut a = spawn_candidate(&cluster, "/election", "a");
    assert!(wait_for_role(&a.handle, Role::Leader, WAIT).await);
    assert!(a.handle.is_leader());

    assert!(matches!(
        a.next_event(WAIT).await,
        Some(LeadershipEvent::Acquired { .. })
    ));
    assert_eq!(cluster.sequence_ids("/election"), vec![0]);

    // Point-in-time reads with no intervening event are idempotent.
    assert_eq!(a.handle.current_role(), Role::Leader);
    assert_eq!(a.handle.current_role(), Role::Leader);

    a.handle.shutdown().await;
}

#[tokio::test]
async fn second_candidate_follows_existing_leader() {
    init_logging();
    let cluster = SimCluster::new();

    let a = spawn_candidate(&cluster, "/election", "a");
    assert!(wait_for_role(&a.handle, Role::Leader, WAIT).await);

    let mut b = spawn_candidate(&cluster, "/election", "b");
    assert!(wait_for_role(&b.handle, Role::Follower, WAIT).await);

    // The leader is unaffected and the follower never acquired anything.
    assert_eq!(a.handle.current_role(), Role::Leader);
    assert!(b.next_event(SETTLE).await.is_none());

    a.handle.shutdown().await;
    b.handle.shutdown().await;
}

#[tokio::test]
async fn three_candidate_failover_cascade() {
    init_logging();
    let cluster = SimCluster::new();

    // Register in order: A gets the smallest sequence id and leads,
    // B watches A, C watches B.
    let mut a = spawn_candidate(&cluster, "/election", "a");
    assert!(wait_for_role(&a.handle, Role::Leader, WAIT).await);
    assert!(matches!(
        a.next_event(WAIT).await,
        Some(LeadershipEvent::Acquired { .. })
    ));

    let mut b = spawn_candidate(&cluster, "/election", "b");
    assert!(wait_for_role(&b.handle, Role::Follower, WAIT).await);

    let mut c = spawn_candidate(&cluster, "/election", "c");
    assert!(wait_for_role(&c.handle, Role::Follower, WAIT).await);

    assert_eq!(cluster.sequence_ids("/election"), vec![0, 1, 2]);

    // A's session closes: B is promoted in one hop.
    a.handle.shutdown().await;
    assert!(wait_for_role(&b.handle, Role::Leader, WAIT).await);
    assert!(matches!(
        b.next_event(WAIT).await,
        Some(LeadershipEvent::Acquired { .. })
    ));

    // C was watching B, not A: nothing changes for it.
    tokio::time::sleep(SETTLE).await;
    assert_eq!(c.handle.current_role(), Role::Follower);
    assert!(c.next_event(SETTLE).await.is_none());

    // B's session closes next: C takes over.
    b.handle.shutdown().await;
    assert!(wait_for_role(&c.handle, Role::Leader, WAIT).await);
    assert!(matches!(
        c.next_event(WAIT).await,
        Some(LeadershipEvent::Acquired { .. })
    ));

    assert!(matches!(
        a.next_event(SETTLE).await,
        Some(LeadershipEvent::Lost { .. })
    ));
    c.handle.shutdown().await;
}
