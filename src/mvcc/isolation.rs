//! Isolation levels, weakest to strongest.
//!
//! The derived ordering is load-bearing: the engine asks `level >= RepeatableRead`
//! to decide whether to capture a snapshot and `level >= Snapshot` to decide
//! whether commit runs conflict detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::MvccError;

/// A named contract bounding which anomalies a transaction may observe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Sees uncommitted writes of in-flight transactions.
    ReadUncommitted,
    /// Sees the latest committed state at every read.
    #[default]
    ReadCommitted,
    /// Sees only transactions that committed before it began.
    RepeatableRead,
    /// Repeatable read plus first-committer-wins on written keys.
    Snapshot,
    /// Snapshot plus rejection of concurrent writes to keys it read.
    Serializable,
}

impl IsolationLevel {
    /// All levels in increasing strictness.
    pub const ALL: [IsolationLevel; 5] = [
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Snapshot,
        IsolationLevel::Serializable,
    ];

    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "read_uncommitted",
            IsolationLevel::ReadCommitted => "read_committed",
            IsolationLevel::RepeatableRead => "repeatable_read",
            IsolationLevel::Snapshot => "snapshot",
            IsolationLevel::Serializable => "serializable",
        }
    }

    /// Whether `begin` captures the set of in-flight transactions.
    #[inline]
    pub fn uses_snapshot(&self) -> bool {
        *self >= IsolationLevel::RepeatableRead
    }

    /// Whether `commit` runs the conflict detector.
    #[inline]
    pub fn validates_on_commit(&self) -> bool {
        *self >= IsolationLevel::Snapshot
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IsolationLevel {
    type Err = MvccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "read_uncommitted" | "readuncommitted" | "ru" => Ok(IsolationLevel::ReadUncommitted),
            "read_committed" | "readcommitted" | "rc" => Ok(IsolationLevel::ReadCommitted),
            "repeatable_read" | "repeatableread" | "rr" => Ok(IsolationLevel::RepeatableRead),
            "snapshot" | "snapshot_isolation" | "si" => Ok(IsolationLevel::Snapshot),
            "serializable" | "ser" => Ok(IsolationLevel::Serializable),
            _ => Err(MvccError::UnknownIsolation(s.to_string())),
        }
    }
}
