//! Observable engine events
//!
//! Events are explicit and typed. Each maps to one stable upper-case name.

use std::fmt;

/// Observable events in mvccdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration resolved at startup
    ConfigLoaded,
    /// Command loop started
    ReplStart,
    /// Command loop finished
    ReplExit,
    /// A session was opened against the database
    SessionOpen,
    /// Engine state found inconsistent; the command loop stops
    EngineFatal,

    // Transactions
    /// Transaction begun
    TxBegin,
    /// Transaction committed
    TxCommit,
    /// Transaction aborted by the caller
    TxAbort,
    /// Commit rejected by conflict detection
    TxSerializationFailure,
    /// Conflict detector found a concurrent committed writer
    ConflictDetected,

    // Data operations
    /// Get resolved
    KvGet,
    /// Set applied
    KvSet,
    /// Delete applied
    KvDelete,
    /// An operation was rejected with an error
    OperationRejected,

    // Version bookkeeping
    /// One version evaluated for visibility
    VisibilityCheck,
    /// Visible versions stamped with a closer
    VersionClosed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ReplStart => "REPL_START",
            Event::ReplExit => "REPL_EXIT",
            Event::SessionOpen => "SESSION_OPEN",
            Event::EngineFatal => "ENGINE_FATAL",

            Event::TxBegin => "TX_BEGIN",
            Event::TxCommit => "TX_COMMIT",
            Event::TxAbort => "TX_ABORT",
            Event::TxSerializationFailure => "TX_SERIALIZATION_FAILURE",
            Event::ConflictDetected => "CONFLICT_DETECTED",

            Event::KvGet => "KV_GET",
            Event::KvSet => "KV_SET",
            Event::KvDelete => "KV_DELETE",
            Event::OperationRejected => "OPERATION_REJECTED",

            Event::VisibilityCheck => "VISIBILITY_CHECK",
            Event::VersionClosed => "VERSION_CLOSED",
        }
    }

    /// Returns true for events that report a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::TxSerializationFailure | Event::OperationRejected | Event::EngineFatal
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
