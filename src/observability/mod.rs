//! Observability subsystem for mvccdb
//!
//! This module provides:
//! - Structured logging (JSON lines on stderr)
//! - Typed events
//! - Engine counters
//! - The debug trace observer interface
//!
//! # Principles
//!
//! 1. Observability is write-only
//! 2. No side effects on engine behavior
//! 3. No async or background threads
//!
//! # Usage
//!
//! ```ignore
//! use mvccdb::observability::{Logger, LogObserver};
//!
//! Logger::info("CONFIG_LOADED", &[("default_isolation", "read_committed")]);
//!
//! // Trace every engine decision to stderr
//! let db = Database::with_observer(EngineConfig::default(), Arc::new(LogObserver::stderr()));
//! ```

mod events;
mod logger;
mod metrics;
mod trace;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use trace::{LogObserver, MemoryObserver, NoopObserver, TraceObserver, TraceRecord};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::info(event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::info(event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::ReplStart);
        log_event(Event::ReplExit);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("debug", "false")]);
    }
}
