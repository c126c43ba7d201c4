//! Example demonstrating leader election with two competing candidates.
//!
//! Both candidates run against the in-memory coordination service from
//! `zelect-testing`. The first to register wins leadership; expiring its
//! session hands leadership to the second, and the first rejoins as a
//! follower with a fresh sequence number.

use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use zelect_engine::{start, ElectionConfig};
use zelect_testing::SimCluster;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cluster = SimCluster::new();

    let alpha_connector = cluster.connector();
    let alpha = start(
        ElectionConfig::new("/election", "alpha:7001").with_address("sim"),
        alpha_connector.clone(),
    );
    let mut alpha_events = alpha.subscribe();

    let beta = start(
        ElectionConfig::new("/election", "beta:7002").with_address("sim"),
        cluster.connector(),
    );
    let mut beta_events = beta.subscribe();

    tokio::spawn(async move {
        while let Some(event) = alpha_events.recv().await {
            info!(?event, "alpha leadership event");
        }
    });
    tokio::spawn(async move {
        while let Some(event) = beta_events.recv().await {
            info!(?event, "beta leadership event");
        }
    });

    sleep(Duration::from_millis(200)).await;
    info!(alpha = %alpha.current_role(), beta = %beta.current_role(), "initial roles");

    // Kill the leader's session: the follower is promoted through its
    // predecessor watch, and the old leader re-registers from scratch.
    if let Some(session) = alpha_connector.session_id() {
        info!("expiring alpha's session");
        cluster.expire_session(session);
    }

    sleep(Duration::from_millis(200)).await;
    info!(alpha = %alpha.current_role(), beta = %beta.current_role(), "roles after failover");

    alpha.shutdown().await;
    beta.shutdown().await;
    Ok(())
}
