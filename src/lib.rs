//! mvccdb - an in-process multi-version concurrency control key-value engine
//!
//! Writes never overwrite: each `set` or `delete` closes the versions the
//! writer can see and (for `set`) appends a new one. Which versions a reader
//! sees depends on its isolation level, from ReadUncommitted up to
//! Serializable. Snapshot and Serializable transactions are validated at
//! commit and fail with a serialization error on conflict.
//!
//! - `mvcc`: transactions, versions, visibility and conflict detection
//! - `engine`: the `Database` object and client `Session`s
//! - `observability`: logging, trace observers and counters
//! - `cli`: configuration, command dispatcher, REPL and script runner

pub mod cli;
pub mod engine;
pub mod mvcc;
pub mod observability;

pub use engine::{Database, EngineConfig, Session};
pub use mvcc::{IsolationLevel, MvccError, MvccResult, TransactionState, TxId};
