//! TxId - Transaction identity
//!
//! - Assigned exactly once, in begin order
//! - Strictly increasing, never reused (not even after abort)
//! - `0` is reserved and means "unset"; it doubles as the open-version marker
//!   in a version's closer slot

use std::fmt;

use serde::{Deserialize, Serialize};

/// A totally ordered transaction identity.
///
/// Because ids are handed out in begin order, comparing two ids also
/// compares when the transactions started.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TxId(u64);

impl TxId {
    /// The reserved "no transaction" id.
    pub const NONE: TxId = TxId(0);

    /// The first id the transaction table hands out.
    pub const FIRST: TxId = TxId(1);

    /// Creates a TxId with the given value.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns true for the reserved id `0`.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Returns the id following this one.
    #[inline]
    pub(crate) fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_id_zero_is_reserved() {
        assert!(TxId::NONE.is_none());
        assert!(!TxId::FIRST.is_none());
        assert_eq!(TxId::new(0), TxId::NONE);
    }

    #[test]
    fn test_tx_id_next() {
        assert_eq!(TxId::FIRST.next(), TxId::new(2));
        assert_eq!(TxId::NONE.next(), TxId::FIRST);
    }

    #[test]
    fn test_tx_id_ordering_follows_begin_order() {
        let earlier = TxId::new(3);
        let later = TxId::new(7);
        assert!(earlier < later);
    }

    #[test]
    fn test_tx_id_display_is_plain_number() {
        assert_eq!(TxId::new(42).to_string(), "42");
    }
}
