//! Engine - the database object and client sessions
//!
//! `Database` owns all engine state (transaction table and version store)
//! behind one critical section and is shared between threads with `Arc`.
//! `Session` binds a client to at most one open transaction.
//!
//! ```ignore
//! let db = Arc::new(Database::new(EngineConfig::default()));
//! let mut session = db.open_session();
//! session.begin(Some(IsolationLevel::Snapshot))?;
//! session.set("x", "1")?;
//! session.commit()?;
//! ```

mod config;
mod database;
mod session;

pub use config::EngineConfig;
pub use database::Database;
pub use session::Session;
