//! Transaction record and its state machine
//!
//! `InProgress -> Committed` or `InProgress -> Aborted`, nothing else.
//! Snapshot, read set and write set grow while in progress and are frozen
//! once the transaction is terminal.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{MvccError, MvccResult};
use super::{IsolationLevel, TxId};

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    InProgress,
    Committed,
    Aborted,
}

impl TransactionState {
    /// Returns the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::InProgress => "in_progress",
            TransactionState::Committed => "committed",
            TransactionState::Aborted => "aborted",
        }
    }

    /// Committed and Aborted are terminal.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::InProgress)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction as recorded in the transaction table.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TxId,
    isolation: IsolationLevel,
    state: TransactionState,
    /// Ids in progress at begin. Empty below RepeatableRead.
    snapshot: BTreeSet<TxId>,
    read_set: BTreeSet<String>,
    write_set: BTreeSet<String>,
}

impl Transaction {
    /// Creates an in-progress transaction.
    pub(crate) fn new(id: TxId, isolation: IsolationLevel, snapshot: BTreeSet<TxId>) -> Self {
        Self {
            id,
            isolation,
            state: TransactionState::InProgress,
            snapshot,
            read_set: BTreeSet::new(),
            write_set: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> TxId {
        self.id
    }

    #[inline]
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    #[inline]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[inline]
    pub fn is_in_progress(&self) -> bool {
        self.state == TransactionState::InProgress
    }

    /// Transactions that were in flight when this one began.
    pub fn snapshot(&self) -> &BTreeSet<TxId> {
        &self.snapshot
    }

    /// Returns true if `id` was in progress when this transaction began.
    #[inline]
    pub fn in_snapshot(&self, id: TxId) -> bool {
        self.snapshot.contains(&id)
    }

    pub fn read_set(&self) -> &BTreeSet<String> {
        &self.read_set
    }

    pub fn write_set(&self) -> &BTreeSet<String> {
        &self.write_set
    }

    pub(crate) fn record_read(&mut self, key: &str) {
        debug_assert!(self.is_in_progress());
        if !self.read_set.contains(key) {
            self.read_set.insert(key.to_string());
        }
    }

    pub(crate) fn record_write(&mut self, key: &str) {
        debug_assert!(self.is_in_progress());
        if !self.write_set.contains(key) {
            self.write_set.insert(key.to_string());
        }
    }

    /// Moves the transaction into a terminal state.
    ///
    /// Fails with `InvalidState` if it is already terminal, leaving the
    /// recorded state untouched.
    pub(crate) fn finish(&mut self, state: TransactionState) -> MvccResult<()> {
        if !state.is_terminal() {
            return Err(MvccError::invalid_state(format!(
                "transaction {} cannot move back to {}",
                self.id, state
            )));
        }
        if self.state.is_terminal() {
            return Err(MvccError::invalid_state(format!(
                "transaction {} is already {}",
                self.id, self.state
            )));
        }
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(id: u64) -> Transaction {
        Transaction::new(TxId::new(id), IsolationLevel::ReadCommitted, BTreeSet::new())
    }

    #[test]
    fn test_new_transaction_in_progress() {
        let tx = txn(1);
        assert!(tx.is_in_progress());
        assert!(tx.read_set().is_empty());
        assert!(tx.write_set().is_empty());
    }

    #[test]
    fn test_commit_is_terminal() {
        let mut tx = txn(1);
        tx.finish(TransactionState::Committed).unwrap();
        assert_eq!(tx.state(), TransactionState::Committed);

        let err = tx.finish(TransactionState::Aborted).unwrap_err();
        assert!(matches!(err, MvccError::InvalidState(_)));
        assert_eq!(tx.state(), TransactionState::Committed);
    }

    #[test]
    fn test_abort_is_terminal() {
        let mut tx = txn(1);
        tx.finish(TransactionState::Aborted).unwrap();
        assert!(tx.finish(TransactionState::Committed).is_err());
        assert_eq!(tx.state(), TransactionState::Aborted);
    }

    #[test]
    fn test_cannot_finish_into_in_progress() {
        let mut tx = txn(1);
        assert!(tx.finish(TransactionState::InProgress).is_err());
        assert!(tx.is_in_progress());
    }

    #[test]
    fn test_read_and_write_sets_deduplicate() {
        let mut tx = txn(1);
        tx.record_read("a");
        tx.record_read("a");
        tx.record_write("b");
        tx.record_write("b");
        tx.record_write("a");

        assert_eq!(tx.read_set().len(), 1);
        assert_eq!(
            tx.write_set().iter().cloned().collect::<Vec<_>>(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_snapshot_membership() {
        let snapshot: BTreeSet<TxId> = [TxId::new(2), TxId::new(4)].into_iter().collect();
        let tx = Transaction::new(TxId::new(5), IsolationLevel::RepeatableRead, snapshot);
        assert!(tx.in_snapshot(TxId::new(2)));
        assert!(!tx.in_snapshot(TxId::new(3)));
    }
}
