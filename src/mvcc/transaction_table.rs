//! TransactionTable - every transaction ever begun, by id
//!
//! - Hands out ids 1, 2, 3, ... in begin order
//! - Never forgets or reuses an id, aborted ones included
//! - Ordered by id, so "in progress" scans come out sorted

use std::collections::{BTreeMap, BTreeSet};

use super::errors::{MvccError, MvccResult};
use super::{IsolationLevel, Transaction, TransactionState, TxId};

/// Transaction registry plus the next-id counter.
#[derive(Debug)]
pub struct TransactionTable {
    transactions: BTreeMap<TxId, Transaction>,
    next_id: TxId,
}

impl TransactionTable {
    /// Creates an empty table whose first id will be 1.
    pub fn new() -> Self {
        Self {
            transactions: BTreeMap::new(),
            next_id: TxId::FIRST,
        }
    }

    /// The id the next `register` call will assign.
    pub fn next_id(&self) -> TxId {
        self.next_id
    }

    /// Number of transactions ever registered.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Ids of every transaction currently in progress.
    pub fn in_progress(&self) -> BTreeSet<TxId> {
        self.transactions
            .values()
            .filter(|tx| tx.is_in_progress())
            .map(Transaction::id)
            .collect()
    }

    /// Allocates the next id and registers an in-progress transaction.
    ///
    /// Levels at RepeatableRead or above get a snapshot of the in-flight ids,
    /// taken before the new id is registered so it never contains itself.
    pub fn register(&mut self, isolation: IsolationLevel) -> TxId {
        let snapshot = if isolation.uses_snapshot() {
            self.in_progress()
        } else {
            BTreeSet::new()
        };

        let id = self.next_id;
        self.next_id = id.next();
        self.transactions
            .insert(id, Transaction::new(id, isolation, snapshot));
        id
    }

    pub fn get(&self, id: TxId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TxId) -> Option<&mut Transaction> {
        self.transactions.get_mut(&id)
    }

    /// Looks up a transaction that engine data refers to.
    ///
    /// A version naming an unknown id means the table is corrupted.
    pub fn lookup(&self, id: TxId) -> MvccResult<&Transaction> {
        self.get(id)
            .ok_or_else(|| MvccError::corrupted(format!("transaction {} is not registered", id)))
    }

    /// Looks up a transaction the caller claims is in progress.
    pub fn active(&self, id: TxId) -> MvccResult<&Transaction> {
        let tx = self.caller_lookup(id)?;
        if !tx.is_in_progress() {
            return Err(MvccError::invalid_state(format!(
                "transaction {} is {}",
                id,
                tx.state()
            )));
        }
        Ok(tx)
    }

    /// Mutable variant of [`TransactionTable::active`].
    pub(crate) fn active_mut(&mut self, id: TxId) -> MvccResult<&mut Transaction> {
        self.active(id)?;
        self.get_mut(id)
            .ok_or_else(|| MvccError::corrupted(format!("transaction {} vanished", id)))
    }

    /// Current state of a transaction.
    pub fn state(&self, id: TxId) -> MvccResult<TransactionState> {
        self.lookup(id).map(Transaction::state)
    }

    fn caller_lookup(&self, id: TxId) -> MvccResult<&Transaction> {
        if id.is_none() {
            return Err(MvccError::invalid_state("transaction id 0 is not valid"));
        }
        self.get(id)
            .ok_or_else(|| MvccError::invalid_state(format!("transaction {} does not exist", id)))
    }
}

impl Default for TransactionTable {
    fn default() -> Self {
        Self::new()
    }
}
