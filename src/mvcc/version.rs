//! Version - One value of a key over a transaction interval
//!
//! - Covers the half-open interval `[creator, closer)`
//! - `closer == TxId::NONE` means no write has superseded it yet
//! - The payload never changes after creation; only closers are stamped
//! - Closers are append-only. The first one is never replaced or reset,
//!   even if it aborts, and writers that overlap with it are added after it.
//!   Whether any close counts is a visibility question.

use super::TxId;

/// A single value of a key.
///
/// Fields are private; the only mutation is [`Version::close`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    /// Transaction that wrote this value.
    creator: TxId,
    /// Transactions that superseded it, in stamping order.
    closers: Vec<TxId>,
    /// The stored value.
    payload: String,
}

impl Version {
    /// Creates a new open version.
    pub fn new(creator: TxId, payload: impl Into<String>) -> Self {
        Self {
            creator,
            closers: Vec::new(),
            payload: payload.into(),
        }
    }

    /// Returns the creating transaction.
    #[inline]
    pub fn creator(&self) -> TxId {
        self.creator
    }

    /// Returns the first closing transaction, `TxId::NONE` while open.
    #[inline]
    pub fn closer(&self) -> TxId {
        self.closers.first().copied().unwrap_or(TxId::NONE)
    }

    /// Every transaction that stamped this version, first closer first.
    #[inline]
    pub fn closers(&self) -> &[TxId] {
        &self.closers
    }

    /// Returns true if `tx` stamped this version.
    #[inline]
    pub fn closed_by(&self, tx: TxId) -> bool {
        self.closers.contains(&tx)
    }

    /// Returns the stored value.
    #[inline]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns true if no transaction has stamped this version.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closers.is_empty()
    }

    /// Adds `closer` to the closing transactions. Stamping twice is a no-op.
    pub(crate) fn close(&mut self, closer: TxId) {
        debug_assert!(!closer.is_none(), "versions are closed by real transactions");
        if !self.closed_by(closer) {
            self.closers.push(closer);
        }
    }
}
