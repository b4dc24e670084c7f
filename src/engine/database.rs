//! Database - the engine object
//!
//! Owns the transaction manager and the version store behind a single
//! critical section. Every operation takes the lock, runs to completion and
//! releases it; nothing inside waits on another transaction. Isolation comes
//! from visibility and commit-time validation, not from the lock.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::config::EngineConfig;
use super::session::Session;
use crate::mvcc::{
    IsolationLevel, MvccError, MvccResult, Transaction, TransactionManager, TransactionState, TxId,
    Version, VersionStore, Visibility, VisibilityReason,
};
use crate::observability::{Event, MetricsRegistry, NoopObserver, TraceObserver, TraceRecord};

/// Everything guarded by the engine lock.
#[derive(Debug, Default)]
struct EngineState {
    manager: TransactionManager,
    store: VersionStore,
}

/// An in-process MVCC key-value database.
///
/// Created once and shared between sessions through `Arc`.
pub struct Database {
    state: Mutex<EngineState>,
    config: EngineConfig,
    observer: Arc<dyn TraceObserver>,
    metrics: MetricsRegistry,
}

impl Database {
    /// Creates a database that traces nothing.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    /// Creates a database reporting to `observer`.
    pub fn with_observer(config: EngineConfig, observer: Arc<dyn TraceObserver>) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            config,
            observer,
            metrics: MetricsRegistry::new(),
        }
    }

    /// Opens a new session bound to this database.
    pub fn open_session(self: &Arc<Self>) -> Session {
        let session = Session::new(Arc::clone(self));
        self.emit(Some(session.id()), || TraceRecord::new(Event::SessionOpen));
        session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Starts a transaction; `None` uses the configured default level.
    pub fn begin(&self, isolation: Option<IsolationLevel>) -> MvccResult<TxId> {
        self.begin_for(None, isolation)
    }

    /// Value of `key` visible to `tx`, `None` if nothing is visible.
    pub fn get(&self, tx: TxId, key: &str) -> MvccResult<Option<String>> {
        self.get_for(None, tx, key)
    }

    /// Writes a new version of `key` under `tx` and returns the stored value.
    pub fn set(&self, tx: TxId, key: &str, value: &str) -> MvccResult<String> {
        self.set_for(None, tx, key, value)
    }

    /// Deletes the version of `key` visible to `tx`.
    pub fn delete(&self, tx: TxId, key: &str) -> MvccResult<()> {
        self.delete_for(None, tx, key)
    }

    /// Commits `tx`; fails with `SerializationFailure` on conflict.
    pub fn commit(&self, tx: TxId) -> MvccResult<()> {
        self.commit_for(None, tx)
    }

    /// Aborts `tx`.
    pub fn abort(&self, tx: TxId) -> MvccResult<()> {
        self.abort_for(None, tx)
    }

    /// Current state of a transaction, `None` if the id was never assigned.
    pub fn transaction_state(&self, tx: TxId) -> MvccResult<Option<TransactionState>> {
        let state = self.lock()?;
        Ok(state.manager.table().get(tx).map(Transaction::state))
    }

    /// Copy of the transaction record for `tx`.
    pub fn transaction(&self, tx: TxId) -> MvccResult<Option<Transaction>> {
        let state = self.lock()?;
        Ok(state.manager.table().get(tx).cloned())
    }

    /// Copy of every version of `key`, in creation order.
    pub fn versions(&self, key: &str) -> MvccResult<Vec<Version>> {
        let state = self.lock()?;
        Ok(state.store.read(key).to_vec())
    }

    pub(crate) fn begin_for(
        &self,
        session: Option<Uuid>,
        isolation: Option<IsolationLevel>,
    ) -> MvccResult<TxId> {
        let isolation = isolation.unwrap_or(self.config.default_isolation);
        let mut state = self.lock()?;
        let id = state.manager.begin(isolation);
        self.metrics.increment_begun();

        let table = state.manager.table();
        self.emit(session, || {
            let snapshot = table
                .get(id)
                .map(|tx| join_ids(tx.snapshot().iter()))
                .unwrap_or_default();
            TraceRecord::new(Event::TxBegin)
                .with_tx(id)
                .with_field("isolation", isolation)
                .with_field("snapshot", snapshot)
        });
        Ok(id)
    }

    pub(crate) fn get_for(
        &self,
        session: Option<Uuid>,
        tx: TxId,
        key: &str,
    ) -> MvccResult<Option<String>> {
        let result = self.with_state(|state| {
            state.manager.record_read(tx, key)?;
            let txn = state.manager.active(tx)?;
            let table = state.manager.table();

            let found = Visibility::visible_version_with(
                txn,
                state.store.read(key),
                table,
                |version, reason| self.trace_check(session, txn, key, version, reason),
            )?;
            Ok(found.version().map(|v| v.payload().to_string()))
        });

        if let Ok(ref value) = result {
            self.metrics.record_get(value.is_some());
            self.emit(session, || {
                TraceRecord::new(Event::KvGet)
                    .with_tx(tx)
                    .with_key(key)
                    .with_field("found", value.is_some())
            });
        }
        self.settle(session, tx, "get", result)
    }

    pub(crate) fn set_for(
        &self,
        session: Option<Uuid>,
        tx: TxId,
        key: &str,
        value: &str,
    ) -> MvccResult<String> {
        let result = self.with_state(|state| {
            let closed = self.close_visible(session, state, tx, key)?;
            state.store.append(key, Version::new(tx, value));
            state.manager.record_write(tx, key)?;
            Ok(closed)
        });

        let result = result.map(|closed| {
            self.metrics.increment_sets();
            self.emit(session, || {
                TraceRecord::new(Event::KvSet)
                    .with_tx(tx)
                    .with_key(key)
                    .with_field("value", value)
                    .with_field("closed", closed)
            });
            value.to_string()
        });
        self.settle(session, tx, "set", result)
    }

    pub(crate) fn delete_for(&self, session: Option<Uuid>, tx: TxId, key: &str) -> MvccResult<()> {
        let result = self.with_state(|state| {
            let closed = self.close_visible(session, state, tx, key)?;
            if closed == 0 {
                return Err(MvccError::KeyNotFound(key.to_string()));
            }
            state.manager.record_write(tx, key)?;
            Ok(closed)
        });

        let result = result.map(|closed| {
            self.metrics.increment_deletes();
            self.emit(session, || {
                TraceRecord::new(Event::KvDelete)
                    .with_tx(tx)
                    .with_key(key)
                    .with_field("closed", closed)
            });
        });
        self.settle(session, tx, "delete", result)
    }

    pub(crate) fn commit_for(&self, session: Option<Uuid>, tx: TxId) -> MvccResult<()> {
        let result = self.with_state(|state| state.manager.commit(tx, &state.store));

        match result {
            Ok(()) => {
                self.metrics.increment_committed();
                self.emit(session, || TraceRecord::new(Event::TxCommit).with_tx(tx));
            }
            Err(MvccError::SerializationFailure {
                with,
                ref key,
                kind,
                ..
            }) => {
                self.metrics.increment_serialization_failures();
                self.emit(session, || {
                    TraceRecord::new(Event::ConflictDetected)
                        .with_tx(tx)
                        .with_key(key.as_str())
                        .with_field("kind", kind)
                        .with_field("with", with)
                });
                self.emit(session, || {
                    TraceRecord::new(Event::TxSerializationFailure).with_tx(tx)
                });
            }
            Err(_) => {}
        }
        self.settle(session, tx, "commit", result)
    }

    pub(crate) fn abort_for(&self, session: Option<Uuid>, tx: TxId) -> MvccResult<()> {
        let result = self.with_state(|state| state.manager.abort(tx));
        if result.is_ok() {
            self.metrics.increment_aborted();
            self.emit(session, || TraceRecord::new(Event::TxAbort).with_tx(tx));
        }
        self.settle(session, tx, "abort", result)
    }

    /// Closes every version of `key` visible to `tx`, tracing each decision.
    fn close_visible(
        &self,
        session: Option<Uuid>,
        state: &mut EngineState,
        tx: TxId,
        key: &str,
    ) -> MvccResult<usize> {
        let txn = state.manager.active(tx)?;
        let table = state.manager.table();

        if self.observer.enabled() {
            for version in state.store.read(key).iter().rev() {
                let reason = Visibility::explain(txn, version, table)?;
                self.trace_check(session, txn, key, version, reason);
            }
        }

        let closed = state.store.close_visible(key, txn, table)?;
        if closed > 0 {
            self.emit(session, || {
                TraceRecord::new(Event::VersionClosed)
                    .with_tx(tx)
                    .with_key(key)
                    .with_field("count", closed)
            });
        }
        Ok(closed)
    }

    fn trace_check(
        &self,
        session: Option<Uuid>,
        txn: &Transaction,
        key: &str,
        version: &Version,
        reason: VisibilityReason,
    ) {
        self.emit(session, || {
            TraceRecord::new(Event::VisibilityCheck)
                .with_tx(txn.id())
                .with_key(key)
                .with_field("isolation", txn.isolation())
                .with_field("creator", version.creator())
                .with_field("closers", join_ids(version.closers().iter()))
                .with_field("reason", reason)
                .with_field("visible", reason.is_visible())
        });
    }

    /// Counts and traces a failed operation, then hands the result back.
    fn settle<T>(
        &self,
        session: Option<Uuid>,
        tx: TxId,
        operation: &'static str,
        result: MvccResult<T>,
    ) -> MvccResult<T> {
        if let Err(ref err) = result {
            if !err.is_serialization_failure() {
                self.metrics.increment_rejected();
            }
            self.emit(session, || {
                TraceRecord::new(Event::OperationRejected)
                    .with_tx(tx)
                    .with_field("operation", operation)
                    .with_field("code", err.code())
                    .with_field("message", err)
            });
        }
        result
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut EngineState) -> MvccResult<T>,
    ) -> MvccResult<T> {
        let mut state = self.lock()?;
        f(&mut state)
    }

    fn lock(&self) -> MvccResult<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|_| MvccError::corrupted("engine lock poisoned by a panicked operation"))
    }

    /// Poisons the engine lock the way a panicking operation would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.state.lock();
            panic!("operation panicked while holding the engine lock");
        }));
    }

    fn emit(&self, session: Option<Uuid>, build: impl FnOnce() -> TraceRecord) {
        if !self.observer.enabled() {
            return;
        }
        let mut record = build();
        if let Some(session) = session {
            record = record.with_session(session);
        }
        self.observer.observe(&record);
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a TxId>) -> String {
    ids.map(TxId::to_string).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvcc::ConflictKind;
    use crate::observability::MemoryObserver;

    fn traced() -> (Database, MemoryObserver) {
        let observer = MemoryObserver::new();
        let db = Database::with_observer(EngineConfig::default(), Arc::new(observer.clone()));
        (db, observer)
    }

    #[test]
    fn test_begin_uses_configured_default() {
        let db = Database::new(EngineConfig::with_default_isolation(
            IsolationLevel::Serializable,
        ));
        let tx = db.begin(None).unwrap();
        assert_eq!(
            db.transaction(tx).unwrap().unwrap().isolation(),
            IsolationLevel::Serializable
        );
    }

    #[test]
    fn test_set_get_within_transaction() {
        let db = Database::default();
        let tx = db.begin(None).unwrap();
        assert_eq!(db.set(tx, "x", "1").unwrap(), "1");
        assert_eq!(db.get(tx, "x").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_overwrite_closes_previous_version() {
        let db = Database::default();
        let tx = db.begin(None).unwrap();
        db.set(tx, "x", "1").unwrap();
        db.set(tx, "x", "2").unwrap();

        let versions = db.versions("x").unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].closer(), tx);
        assert!(versions[1].is_open());
        assert_eq!(db.get(tx, "x").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_delete_missing_key_names_key() {
        let db = Database::default();
        let tx = db.begin(None).unwrap();
        let err = db.delete(tx, "ghost").unwrap_err();
        assert_eq!(err, MvccError::KeyNotFound("ghost".to_string()));
        assert!(err.to_string().contains("ghost"));

        let txn = db.transaction(tx).unwrap().unwrap();
        assert!(txn.write_set().is_empty());
        assert_eq!(txn.state(), TransactionState::InProgress);
    }

    #[test]
    fn test_read_and_write_sets_recorded() {
        let db = Database::default();
        let tx = db.begin(Some(IsolationLevel::Serializable)).unwrap();
        db.get(tx, "r").unwrap();
        db.set(tx, "w", "v").unwrap();

        let txn = db.transaction(tx).unwrap().unwrap();
        assert!(txn.read_set().contains("r"));
        assert!(txn.write_set().contains("w"));
        assert!(!txn.read_set().contains("w"));
    }

    #[test]
    fn test_operations_on_finished_transaction_are_invalid() {
        let db = Database::default();
        let tx = db.begin(None).unwrap();
        db.commit(tx).unwrap();

        assert!(matches!(db.get(tx, "x"), Err(MvccError::InvalidState(_))));
        assert!(matches!(db.set(tx, "x", "1"), Err(MvccError::InvalidState(_))));
        assert!(matches!(db.delete(tx, "x"), Err(MvccError::InvalidState(_))));
        assert!(matches!(db.commit(tx), Err(MvccError::InvalidState(_))));
        assert!(matches!(db.abort(tx), Err(MvccError::InvalidState(_))));
        assert_eq!(db.metrics().snapshot().rejected, 5);
    }

    #[test]
    fn test_unknown_transaction_is_invalid() {
        let db = Database::default();
        assert!(matches!(
            db.get(TxId::new(12), "x"),
            Err(MvccError::InvalidState(_))
        ));
        assert_eq!(db.transaction_state(TxId::new(12)).unwrap(), None);
    }

    #[test]
    fn test_serialization_failure_metrics_and_trace() {
        let (db, observer) = traced();
        let t1 = db.begin(Some(IsolationLevel::Snapshot)).unwrap();
        let t2 = db.begin(Some(IsolationLevel::Snapshot)).unwrap();
        db.set(t1, "x", "a").unwrap();
        db.set(t2, "x", "b").unwrap();
        db.commit(t1).unwrap();

        let err = db.commit(t2).unwrap_err();
        assert!(matches!(
            err,
            MvccError::SerializationFailure {
                kind: ConflictKind::WriteWrite,
                ..
            }
        ));
        assert_eq!(db.transaction_state(t2).unwrap(), Some(TransactionState::Aborted));

        let metrics = db.metrics().snapshot();
        assert_eq!(metrics.transactions_committed, 1);
        assert_eq!(metrics.serialization_failures, 1);
        assert_eq!(metrics.transactions_aborted, 1);
        assert_eq!(metrics.rejected, 0);

        let events = observer.events();
        assert!(events.contains(&Event::ConflictDetected));
        assert!(events.contains(&Event::TxSerializationFailure));
    }

    #[test]
    fn test_trace_reports_visibility_decisions() {
        let (db, observer) = traced();
        let t1 = db.begin(None).unwrap();
        db.set(t1, "x", "1").unwrap();
        db.commit(t1).unwrap();

        let t2 = db.begin(None).unwrap();
        observer.clear();
        db.get(t2, "x").unwrap();

        let records = observer.records();
        let check = records
            .iter()
            .find(|r| r.event == Event::VisibilityCheck)
            .unwrap();
        assert_eq!(check.tx, Some(t2));
        assert_eq!(check.field("creator"), Some("1"));
        assert_eq!(check.field("reason"), Some("open"));
        assert_eq!(check.field("visible"), Some("true"));
        assert_eq!(records.last().unwrap().event, Event::KvGet);
    }

    #[test]
    fn test_poisoned_lock_is_corruption() {
        let db = Database::default();
        let tx = db.begin(None).unwrap();
        db.poison();

        let err = db.get(tx, "x").unwrap_err();
        assert_eq!(err.code(), "MVCC_CORRUPTED");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_noop_observer_behaves_like_traced() {
        let (traced_db, _observer) = traced();
        let plain_db = Database::default();

        for db in [&traced_db, &plain_db] {
            let t1 = db.begin(None).unwrap();
            db.set(t1, "k", "v").unwrap();
            db.abort(t1).unwrap();
            let t2 = db.begin(None).unwrap();
            assert_eq!(db.get(t2, "k").unwrap(), None);
        }
        assert_eq!(traced_db.versions("k").unwrap(), plain_db.versions("k").unwrap());
    }
}
