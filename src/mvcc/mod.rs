//! MVCC core
//!
//! Every write appends a new version instead of overwriting, and every
//! version remembers which transaction created it and which one closed it.
//! Isolation is decided by who may see which version and, for the two
//! strictest levels, by validating at commit.
//!
//! This module provides:
//! - `TxId` - Transaction identity, strictly increasing from 1
//! - `IsolationLevel` - ReadUncommitted through Serializable
//! - `Transaction` / `TransactionTable` - Lifecycle and snapshot bookkeeping
//! - `Version` / `VersionChain` / `VersionStore` - Append-only versioned data
//! - `Visibility` - Which version a transaction observes
//! - `ConflictDetector` - First-committer-wins and read-write validation
//! - `TransactionManager` - begin / commit / abort

mod conflict;
mod errors;
mod isolation;
mod manager;
mod transaction;
mod transaction_table;
mod tx_id;
mod version;
mod version_chain;
mod version_store;
mod visibility;

pub use conflict::{Conflict, ConflictDetector, ConflictKind};
pub use errors::{MvccError, MvccResult};
pub use isolation::IsolationLevel;
pub use manager::TransactionManager;
pub use transaction::{Transaction, TransactionState};
pub use transaction_table::TransactionTable;
pub use tx_id::TxId;
pub use version::Version;
pub use version_chain::VersionChain;
pub use version_store::VersionStore;
pub use visibility::{Visibility, VisibilityReason, VisibilityResult};
