//! # Error Types
//!
//! Error taxonomy for the zelect election protocol.
//!
//! Errors fall into four categories with distinct recovery rules:
//!
//! - **Transient** (connection loss, timeouts): the session layer recovers
//!   them; the state machine suspends and resumes without re-registering.
//! - **Session-fatal** (`SessionExpired`): recovered by full re-registration
//!   with a fresh sequence number; any leadership held is genuinely lost.
//! - **Logical** (`StaleEntry`, `AlreadyRegistered`): ordering or programming
//!   errors, fatal for the election attempt, never silently retried.
//! - **Corrupted-state** (`CorruptedState`): an external invariant violation
//!   the core cannot reason about; fatal, never retried.

use crate::SequenceId;
use thiserror::Error;

/// Errors that can occur during election operations.
#[derive(Error, Debug)]
pub enum ElectionError {
    /// Could not reach or parse the coordination service address
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Operation exceeded its timeout limit
    #[error("Timeout occurred: {operation}")]
    Timeout { operation: String },

    /// Session dropped mid-request; the service may still recover it
    #[error("Connection lost: {message}")]
    ConnectionLoss { message: String },

    /// Referenced path does not exist on the coordination service
    #[error("No node at {path}")]
    NoNode { path: String },

    /// A node already exists at the given path
    #[error("Node already exists at {path}")]
    NodeExists { path: String },

    /// The session is not authorized for the given path
    #[error("Not authorized for {path}")]
    NoAuth { path: String },

    /// Conditional delete failed because the version moved
    #[error("Version mismatch at {path}")]
    VersionMismatch { path: String },

    /// The service destroyed the session; every ephemeral entry is gone
    #[error("Session expired")]
    SessionExpired,

    /// `register` called twice on one live session without an expiry between
    #[error("Already registered as {path}")]
    AlreadyRegistered { path: String },

    /// Own entry missing from a fresh snapshot; the caller must re-register
    #[error("Own entry {sequence_id} missing from election snapshot")]
    StaleEntry { sequence_id: SequenceId },

    /// The coordination service broke one of its own invariants
    #[error("Corrupted election state: {details}")]
    CorruptedState { details: String },

    /// Payload serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Results in the zelect election system.
pub type Result<T> = std::result::Result<T, ElectionError>;

impl ElectionError {
    /// Creates a new connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new connection-loss error with the given message.
    pub fn connection_loss(message: impl Into<String>) -> Self {
        Self::ConnectionLoss {
            message: message.into(),
        }
    }

    /// Creates a new timeout error naming the operation that expired.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Creates a new corrupted-state error with the given details.
    pub fn corrupted(details: impl Into<String>) -> Self {
        Self::CorruptedState {
            details: details.into(),
        }
    }

    /// Creates a new internal error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is expected to clear once the session recovers.
    ///
    /// Transient errors suspend the state machine in `Disconnected`; the
    /// current registration stays valid and is re-evaluated on reconnect.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionLoss { .. } | Self::Timeout { .. }
        )
    }

    /// Whether this error invalidates the session and every ephemeral entry
    /// it owned, forcing a fresh registration.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
