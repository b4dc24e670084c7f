//! TransactionManager - begin, commit and abort
//!
//! Owns the transaction table and is the only code that changes a
//! transaction's state. Both commit outcomes are terminal: a commit that
//! loses a conflict aborts the transaction and the caller must begin anew.

use super::errors::{MvccError, MvccResult};
use super::{
    Conflict, ConflictDetector, IsolationLevel, Transaction, TransactionState, TransactionTable,
    TxId, VersionStore,
};

/// Transaction lifecycle orchestration.
#[derive(Debug, Default)]
pub struct TransactionManager {
    table: TransactionTable,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the transaction table.
    pub fn table(&self) -> &TransactionTable {
        &self.table
    }

    /// Starts a transaction at `isolation` and returns its id.
    pub fn begin(&mut self, isolation: IsolationLevel) -> TxId {
        self.table.register(isolation)
    }

    /// An in-progress transaction, or `InvalidState`.
    pub fn active(&self, id: TxId) -> MvccResult<&Transaction> {
        self.table.active(id)
    }

    /// Adds `key` to the read set of an in-progress transaction.
    pub fn record_read(&mut self, id: TxId, key: &str) -> MvccResult<()> {
        self.table.active_mut(id)?.record_read(key);
        Ok(())
    }

    /// Adds `key` to the write set of an in-progress transaction.
    pub fn record_write(&mut self, id: TxId, key: &str) -> MvccResult<()> {
        self.table.active_mut(id)?.record_write(key);
        Ok(())
    }

    /// Commits `id`, validating it first at Snapshot and above.
    ///
    /// On conflict the transaction is aborted and `SerializationFailure` is
    /// returned.
    pub fn commit(&mut self, id: TxId, store: &VersionStore) -> MvccResult<()> {
        let conflict: Option<Conflict> = {
            let tx = self.table.active(id)?;
            ConflictDetector::check(tx, store, &self.table)?
        };

        match conflict {
            None => self.finish(id, TransactionState::Committed),
            Some(conflict) => {
                self.finish(id, TransactionState::Aborted)?;
                Err(MvccError::SerializationFailure {
                    tx: id,
                    with: conflict.with,
                    key: conflict.key,
                    kind: conflict.kind,
                })
            }
        }
    }

    /// Aborts `id`. Versions it closed stay stamped; visibility ignores them.
    pub fn abort(&mut self, id: TxId) -> MvccResult<()> {
        self.finish(id, TransactionState::Aborted)
    }

    fn finish(&mut self, id: TxId, state: TransactionState) -> MvccResult<()> {
        self.table.active_mut(id)?.finish(state)
    }
}
