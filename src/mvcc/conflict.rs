//! Commit-time conflict detection for Snapshot and Serializable
//!
//! A committed transaction `C` is concurrent with `T` when `C` began after
//! `T` or was in flight when `T` began. Either way `T` never saw its writes.
//!
//! - Write-write: a concurrent committed writer touched a key in `T`'s write
//!   set. First committer wins, so `T` fails.
//! - Read-write (Serializable only): a concurrent committed writer touched a
//!   key in `T`'s read set. `T` acted on stale data; this closes write skew.
//!
//! Lower levels never reach this module.

use std::fmt;

use super::errors::MvccResult;
use super::{IsolationLevel, Transaction, TransactionState, TransactionTable, TxId, VersionStore};

/// Which check found the conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    WriteWrite,
    ReadWrite,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::WriteWrite => "write_write",
            ConflictKind::ReadWrite => "read_write",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub key: String,
    /// The concurrent transaction that committed first.
    pub with: TxId,
}

/// Stateless conflict detector.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Validates `tx` against everything committed concurrently with it.
    ///
    /// Returns the first conflict found, scanning the write set before the
    /// read set and keys in sorted order.
    pub fn check(
        tx: &Transaction,
        store: &VersionStore,
        table: &TransactionTable,
    ) -> MvccResult<Option<Conflict>> {
        if !tx.isolation().validates_on_commit() {
            return Ok(None);
        }

        if let Some(conflict) =
            Self::scan(tx, tx.write_set().iter(), ConflictKind::WriteWrite, store, table)?
        {
            return Ok(Some(conflict));
        }

        if tx.isolation() == IsolationLevel::Serializable {
            return Self::scan(tx, tx.read_set().iter(), ConflictKind::ReadWrite, store, table);
        }

        Ok(None)
    }

    fn scan<'k>(
        tx: &Transaction,
        keys: impl Iterator<Item = &'k String>,
        kind: ConflictKind,
        store: &VersionStore,
        table: &TransactionTable,
    ) -> MvccResult<Option<Conflict>> {
        for key in keys {
            for version in store.read(key) {
                // A delete only stamps a closer, so every closer counts as a writer.
                let writers =
                    std::iter::once(version.creator()).chain(version.closers().iter().copied());
                for other in writers {
                    if other == tx.id() || !Self::concurrent(tx, other) {
                        continue;
                    }
                    if table.state(other)? == TransactionState::Committed {
                        return Ok(Some(Conflict {
                            kind,
                            key: key.clone(),
                            with: other,
                        }));
                    }
                }
            }
        }
        Ok(None)
    }

    #[inline]
    fn concurrent(tx: &Transaction, other: TxId) -> bool {
        other > tx.id() || tx.in_snapshot(other)
    }
}
