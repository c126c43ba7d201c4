//! # Zelect Testing
//!
//! Testing utilities for zelect leader election: an in-memory coordination
//! service with real ephemeral/sequential/watch semantics and fault
//! injection, plus a scenario harness for spinning up candidates.
//!
//! The simulator is the reference implementation of the `zelect-core`
//! coordination traits; the engine's integration tests and examples run
//! entirely against it.

pub mod harness;
pub mod sim;

pub use harness::{spawn_candidate, wait_for_role, Candidate};
pub use sim::{SessionId, SimCluster, SimConnector, SimSession};
