//! MVCC error types
//!
//! Error codes:
//! - MVCC_INVALID_STATE (ERROR)
//! - MVCC_KEY_NOT_FOUND (ERROR)
//! - MVCC_SERIALIZATION_FAILURE (ERROR)
//! - MVCC_UNKNOWN_ISOLATION (ERROR)
//! - MVCC_CORRUPTED (FATAL)

use thiserror::Error;

use super::{ConflictKind, TxId};
use crate::observability::Severity;

/// Result type for engine operations
pub type MvccResult<T> = Result<T, MvccError>;

/// Engine errors. None of them are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MvccError {
    /// Protocol misuse by the caller.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Delete of a key with no visible version.
    #[error("delete failed: key {0:?} not found")]
    KeyNotFound(String),

    /// Commit-time conflict. The transaction is already aborted.
    #[error("serialization failure: transaction {tx} lost a {kind} conflict on key {key:?} to committed transaction {with}")]
    SerializationFailure {
        tx: TxId,
        with: TxId,
        key: String,
        kind: ConflictKind,
    },

    /// Isolation level name could not be parsed.
    #[error("unknown isolation level: {0:?}")]
    UnknownIsolation(String),

    /// Transaction table or store is internally inconsistent.
    #[error("corrupted engine state: {0}")]
    Corrupted(String),
}

impl MvccError {
    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a corruption error
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "MVCC_INVALID_STATE",
            Self::KeyNotFound(_) => "MVCC_KEY_NOT_FOUND",
            Self::SerializationFailure { .. } => "MVCC_SERIALIZATION_FAILURE",
            Self::UnknownIsolation(_) => "MVCC_UNKNOWN_ISOLATION",
            Self::Corrupted(_) => "MVCC_CORRUPTED",
        }
    }

    /// Returns the severity this error is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Self::Corrupted(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// True for commit-time conflicts; the caller may begin a new transaction and retry.
    pub fn is_serialization_failure(&self) -> bool {
        matches!(self, Self::SerializationFailure { .. })
    }
}
