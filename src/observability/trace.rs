//! Debug trace of engine operations
//!
//! The engine reports every operation and every visibility decision it makes
//! to a `TraceObserver` chosen once at startup. Observers are write-only: the
//! engine never reads anything back, so tracing cannot change behavior.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::events::Event;
use super::logger::{Logger, Severity};
use crate::mvcc::TxId;

/// A single trace record.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    /// When the record was produced.
    pub timestamp: DateTime<Utc>,

    /// What happened.
    pub event: Event,

    /// Session that issued the operation (if any).
    pub session: Option<Uuid>,

    /// Transaction the operation ran under (if any).
    pub tx: Option<TxId>,

    /// Key the operation touched (if any).
    pub key: Option<String>,

    /// Additional event-specific fields, in insertion order.
    pub fields: Vec<(&'static str, String)>,
}

impl TraceRecord {
    /// Create a new record stamped with the current time.
    pub fn new(event: Event) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            session: None,
            tx: None,
            key: None,
            fields: Vec::new(),
        }
    }

    /// Set the session.
    pub fn with_session(mut self, session: Uuid) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the transaction.
    pub fn with_tx(mut self, tx: TxId) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set the key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add a field.
    pub fn with_field(mut self, name: &'static str, value: impl ToString) -> Self {
        self.fields.push((name, value.to_string()));
        self
    }

    /// Value of a field added with [`TraceRecord::with_field`].
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Severity this record is logged at.
    pub fn severity(&self) -> Severity {
        if self.event.is_failure() {
            Severity::Warn
        } else {
            Severity::Trace
        }
    }

    /// Renders the record as one JSON log line.
    pub fn to_log_line(&self) -> String {
        let ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let session = self.session.map(|s| s.to_string());
        let tx = self.tx.map(|t| t.to_string());

        let mut fields: Vec<(&str, &str)> = vec![("ts", ts.as_str())];
        if let Some(ref session) = session {
            fields.push(("session", session.as_str()));
        }
        if let Some(ref tx) = tx {
            fields.push(("tx", tx.as_str()));
        }
        if let Some(ref key) = self.key {
            fields.push(("key", key.as_str()));
        }
        fields.extend(self.fields.iter().map(|(k, v)| (*k, v.as_str())));

        Logger::format_line(self.severity(), self.event.as_str(), &fields)
    }
}

/// Receives trace records from the engine.
pub trait TraceObserver: Send + Sync {
    /// Whether records should be produced at all.
    ///
    /// The engine skips building records when this is false.
    fn enabled(&self) -> bool {
        true
    }

    /// Accept one record. Must not fail or block for long.
    fn observe(&self, record: &TraceRecord);
}

/// Observer that discards everything. The default when debug is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {
    fn enabled(&self) -> bool {
        false
    }

    fn observe(&self, _record: &TraceRecord) {}
}

/// Observer that writes each record as a JSON log line.
pub struct LogObserver {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl LogObserver {
    /// Log to stderr.
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Log to an arbitrary writer.
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }
}

impl TraceObserver for LogObserver {
    fn observe(&self, record: &TraceRecord) {
        let line = record.to_log_line();
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = sink.write_all(line.as_bytes());
        let _ = sink.flush();
    }
}

/// In-memory observer for tests and inspection.
#[derive(Debug, Default, Clone)]
pub struct MemoryObserver {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl MemoryObserver {
    /// Create a new in-memory observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded entries.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.lock().clone()
    }

    /// Events in the order they were observed.
    pub fn events(&self) -> Vec<Event> {
        self.lock().iter().map(|r| r.event).collect()
    }

    /// Get the number of records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TraceRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TraceObserver for MemoryObserver {
    fn observe(&self, record: &TraceRecord) {
        self.lock().push(record.clone());
    }
}
