//! Shutdown and termination behavior.

use std::time::Duration;
use tokio::time::timeout;
use zelect_core::Role;
use zelect_engine::{start, ElectionConfig, LeadershipEvent};
use zelect_testing::{spawn_candidate, wait_for_role, SimCluster};

const WAIT: Duration = Duration::from_secs(2);

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

#[tokio::test]
async fn shutdown_releases_entry_and_promotes_follower() {
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

    a.handle.shutdown().await;
    assert_eq!(a.handle.current_role(), Role::Closed);
    assert_eq!(
        a.next_event(WAIT).await,
        Some(LeadershipEvent::Lost {
            reason: "shutdown".to_string()
        })
    );

    // Explicit deletion on shutdown promotes the follower without waiting
    // for any session timeout.
    assert_eq!(cluster.sequence_ids("/election"), vec![1]);
    assert!(wait_for_role(&b.handle, Role::Leader, WAIT).await);

    // Idempotent.
    a.handle.shutdown().await;
    assert_eq!(a.handle.current_role(), Role::Closed);

    b.handle.shutdown().await;
}

#[tokio::test]
async fn connect_failure_surfaces_as_terminated() {
    init_logging();
    let cluster = SimCluster::new();

    // The simulator rejects an empty address the way a real client rejects a
    // malformed one.
    let config = ElectionConfig::new("/election", "a").with_address("");
    let handle = start(config, cluster.connector());
    let mut events = handle.subscribe();

    match timeout(WAIT, events.recv()).await {
        Ok(Some(LeadershipEvent::Terminated { reason })) => {
            assert!(reason.contains("connect failed"), "unexpected reason: {reason}");
        }
        other => panic!("expected Terminated, got {other:?}"),
    }
    assert!(wait_for_role(&handle, Role::Closed, WAIT).await);

    handle.shutdown().await;
}
