//! # Zelect Core - Leader Election Building Blocks
//!
//! Core components for electing exactly one leader among distributed process
//! instances through a shared, strongly-consistent coordination service (a
//! ZooKeeper-like store with ephemeral entries, sequential naming, and
//! one-shot change watches).
//!
//! ## Components
//!
//! - **Types**: [`ElectionEntry`], [`ElectionSnapshot`], [`Role`],
//!   [`SessionState`] and the identifier newtypes
//! - **Evaluator**: the pure [`evaluate`] function deciding leadership by
//!   sequence-number comparison and selecting the immediate predecessor as
//!   the single entry to watch
//! - **Coordination Abstraction**: [`CoordinationConnector`] /
//!   [`CoordinationSession`] traits plus the tagged [`CoordinationEvent`]
//!   stream delivered per session
//! - **Error Handling**: [`ElectionError`] with transient / session-fatal /
//!   logical / corrupted-state categorization
//!
//! The runtime state machine that drives these pieces lives in
//! `zelect-engine`; an in-memory coordination service for tests lives in
//! `zelect-testing`.

pub mod coordination;
pub mod error;
pub mod evaluator;
pub mod types;

// Re-export commonly used types for convenience
pub use coordination::{
    ChildEntry, CoordinationConnector, CoordinationEvent, CoordinationSession, EventReceiver,
    WatchEvent,
};
pub use error::{ElectionError, Result};
pub use evaluator::{evaluate, Evaluation};
pub use types::{
    ElectionEntry, ElectionSnapshot, EntryPayload, InstanceId, Role, SequenceId, SessionState,
};
