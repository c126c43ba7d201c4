//! # Zelect Engine
//!
//! The runtime half of zelect leader election: a single-task state machine
//! that registers a candidacy, evaluates leadership by sequence-number
//! ordering, and watches only its immediate predecessor so a full failover
//! cascade costs one notification per rank change instead of a herd.
//!
//! ## Key Components
//!
//! - **[`start`] / [`ElectionHandle`]**: spawn the state machine, observe the
//!   role, subscribe to leadership events, shut down
//! - **[`ElectionConfig`]**: election path, instance id, address, timeouts
//! - **[`Registrar`]**: ephemeral sequential registration per session
//! - **[`WatchDispatcher`]**: one armed predecessor watch at a time
//! - **[`LeadershipBus`]**: `Acquired` / `Lost` / `Terminated` notifications
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use zelect_engine::{start, ElectionConfig};
//! use zelect_testing::SimCluster;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cluster = SimCluster::new();
//!     let config = ElectionConfig::new("/election", "web-1:8080").with_address("sim");
//!
//!     let handle = start(config, cluster.connector());
//!     let mut events = handle.subscribe();
//!
//!     // React to leadership changes.
//!     while let Some(event) = events.recv().await {
//!         println!("leadership event: {:?}", event);
//!     }
//!
//!     handle.shutdown().await;
//! }
//! ```

pub mod config;
pub mod engine;
pub mod notifications;
pub mod registrar;
pub mod watch;

pub use config::ElectionConfig;
pub use engine::{start, ElectionHandle, EngineCommand};
pub use notifications::{LeadershipBus, LeadershipEvent};
pub use registrar::{Registrar, CANDIDATE_PREFIX};
pub use watch::WatchDispatcher;
