//! Session - one client connection's view of the database
//!
//! A session holds at most one open transaction. Every data operation runs
//! under that transaction; issuing one without `begin` is an `InvalidState`.
//! Sessions are independent, so concurrent clients each open their own.

use std::sync::Arc;

use uuid::Uuid;

use super::database::Database;
use crate::mvcc::{IsolationLevel, MvccError, MvccResult, TxId};

/// A client connection bound to a [`Database`].
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    db: Arc<Database>,
    tx: Option<TxId>,
}

impl Session {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self {
            id: Uuid::new_v4(),
            db,
            tx: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// The open transaction, if any.
    pub fn transaction(&self) -> Option<TxId> {
        self.tx
    }

    /// Opens a transaction; `None` uses the database default level.
    pub fn begin(&mut self, isolation: Option<IsolationLevel>) -> MvccResult<TxId> {
        if let Some(tx) = self.tx {
            return Err(MvccError::invalid_state(format!(
                "transaction {tx} already open in this session"
            )));
        }
        let tx = self.db.begin_for(Some(self.id), isolation)?;
        self.tx = Some(tx);
        Ok(tx)
    }

    pub fn get(&self, key: &str) -> MvccResult<Option<String>> {
        let tx = self.current()?;
        self.db.get_for(Some(self.id), tx, key)
    }

    pub fn set(&self, key: &str, value: &str) -> MvccResult<String> {
        let tx = self.current()?;
        self.db.set_for(Some(self.id), tx, key, value)
    }

    pub fn delete(&self, key: &str) -> MvccResult<()> {
        let tx = self.current()?;
        self.db.delete_for(Some(self.id), tx, key)
    }

    /// Commits the open transaction.
    ///
    /// After a serialization failure the session has no transaction and the
    /// client runs `begin` again. A fatal error keeps the binding, since the
    /// engine never got to finish the transaction.
    pub fn commit(&mut self) -> MvccResult<()> {
        let tx = self.current()?;
        let result = self.db.commit_for(Some(self.id), tx);
        self.release(&result);
        result
    }

    pub fn abort(&mut self) -> MvccResult<()> {
        let tx = self.current()?;
        let result = self.db.abort_for(Some(self.id), tx);
        self.release(&result);
        result
    }

    fn release(&mut self, result: &MvccResult<()>) {
        match result {
            Err(err) if err.is_fatal() => {}
            _ => self.tx = None,
        }
    }

    fn current(&self) -> MvccResult<TxId> {
        self.tx
            .ok_or_else(|| MvccError::invalid_state("no transaction open; run begin first"))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = self.db.abort_for(Some(self.id), tx);
        }
    }
}
