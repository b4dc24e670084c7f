//! MVCC Visibility - which versions a transaction may observe
//!
//! ## Creator rule
//!
//! `creator_visible(T, origin)` decides whether the effects of `origin` are
//! visible to `T`:
//! 1. `origin == T` → visible (a transaction sees its own writes)
//! 2. `origin` aborted → invisible
//! 3. `origin` in progress → visible only under ReadUncommitted
//! 4. `origin` committed:
//!    - ReadUncommitted / ReadCommitted → visible (current commit status)
//!    - RepeatableRead and stricter → visible unless `origin` was in flight
//!      at `T`'s begin or began after `T`
//!
//! ## Version rule
//!
//! A version `[creator, closer)` is visible to `T` when its creator is visible
//! and none of its closers is. Open versions stay visible and versions `T`
//! closed itself are gone. A version closed by others remains visible exactly
//! as long as every one of those closers is invisible to `T`.
//!
//! The same two predicates serve every isolation level; only the level value
//! changes the outcome. Evaluation is pure and never mutates its inputs.

use std::fmt;

use super::errors::MvccResult;
use super::{IsolationLevel, Transaction, TransactionState, TransactionTable, TxId, Version};

/// Result of visibility evaluation for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityResult<'a> {
    /// A visible version exists
    Visible(&'a Version),
    /// No version of the key is visible
    Invisible,
}

impl<'a> VisibilityResult<'a> {
    /// Returns the visible version if any
    pub fn version(&self) -> Option<&'a Version> {
        match self {
            VisibilityResult::Visible(v) => Some(v),
            VisibilityResult::Invisible => None,
        }
    }

    /// Returns true if visible
    pub fn is_visible(&self) -> bool {
        matches!(self, VisibilityResult::Visible(_))
    }
}

/// Why a single version is or is not visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityReason {
    /// The creating transaction's effects are not visible.
    CreatorHidden,
    /// Never closed.
    Open,
    /// Closed by the reading transaction itself.
    ClosedBySelf,
    /// Closed by a transaction whose effects are visible.
    ClosedByVisible,
    /// Closed by a transaction whose effects are not visible.
    ClosedByHidden,
}

impl VisibilityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityReason::CreatorHidden => "creator_hidden",
            VisibilityReason::Open => "open",
            VisibilityReason::ClosedBySelf => "closed_by_self",
            VisibilityReason::ClosedByVisible => "closed_by_visible",
            VisibilityReason::ClosedByHidden => "closed_by_hidden",
        }
    }

    /// Whether the version is visible for this reason.
    pub fn is_visible(&self) -> bool {
        matches!(
            self,
            VisibilityReason::Open | VisibilityReason::ClosedByHidden
        )
    }
}

impl fmt::Display for VisibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateless visibility resolver.
///
/// Unknown transaction ids in a version surface as `MvccError::Corrupted`.
pub struct Visibility;

impl Visibility {
    /// Whether the effects of `origin` are visible to `tx`.
    pub fn creator_visible(
        tx: &Transaction,
        origin: TxId,
        table: &TransactionTable,
    ) -> MvccResult<bool> {
        if origin == tx.id() {
            return Ok(true);
        }

        let visible = match table.state(origin)? {
            TransactionState::Aborted => false,
            TransactionState::InProgress => tx.isolation() == IsolationLevel::ReadUncommitted,
            TransactionState::Committed => {
                if tx.isolation().uses_snapshot() {
                    origin < tx.id() && !tx.in_snapshot(origin)
                } else {
                    true
                }
            }
        };
        Ok(visible)
    }

    /// Explains the visibility of one version to `tx`.
    pub fn explain(
        tx: &Transaction,
        version: &Version,
        table: &TransactionTable,
    ) -> MvccResult<VisibilityReason> {
        if !Self::creator_visible(tx, version.creator(), table)? {
            return Ok(VisibilityReason::CreatorHidden);
        }

        if version.is_open() {
            return Ok(VisibilityReason::Open);
        }
        if version.closed_by(tx.id()) {
            return Ok(VisibilityReason::ClosedBySelf);
        }
        for &closer in version.closers() {
            if Self::creator_visible(tx, closer, table)? {
                return Ok(VisibilityReason::ClosedByVisible);
            }
        }
        Ok(VisibilityReason::ClosedByHidden)
    }

    /// Whether one version is visible to `tx`.
    pub fn version_visible(
        tx: &Transaction,
        version: &Version,
        table: &TransactionTable,
    ) -> MvccResult<bool> {
        Self::explain(tx, version, table).map(|reason| reason.is_visible())
    }

    /// The newest version of a chain visible to `tx`.
    pub fn visible_version<'a>(
        tx: &Transaction,
        versions: &'a [Version],
        table: &TransactionTable,
    ) -> MvccResult<VisibilityResult<'a>> {
        Self::visible_version_with(tx, versions, table, |_, _| {})
    }

    /// Like [`Visibility::visible_version`], reporting each version examined
    /// (newest first) to `inspect` along with its reason.
    pub fn visible_version_with<'a>(
        tx: &Transaction,
        versions: &'a [Version],
        table: &TransactionTable,
        mut inspect: impl FnMut(&Version, VisibilityReason),
    ) -> MvccResult<VisibilityResult<'a>> {
        for version in versions.iter().rev() {
            let reason = Self::explain(tx, version, table)?;
            inspect(version, reason);
            if reason.is_visible() {
                return Ok(VisibilityResult::Visible(version));
            }
        }
        Ok(VisibilityResult::Invisible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(table: &mut TransactionTable, id: TxId) {
        table
            .active_mut(id)
            .unwrap()
            .finish(TransactionState::Committed)
            .unwrap();
    }

    fn abort(table: &mut TransactionTable, id: TxId) {
        table
            .active_mut(id)
            .unwrap()
            .finish(TransactionState::Aborted)
            .unwrap();
    }

    fn visible(table: &TransactionTable, reader: TxId, version: &Version) -> bool {
        let tx = table.get(reader).unwrap();
        Visibility::version_visible(tx, version, table).unwrap()
    }

    #[test]
    fn test_own_writes_visible_at_every_level() {
        for level in IsolationLevel::ALL {
            let mut table = TransactionTable::new();
            let t = table.register(level);
            let version = Version::new(t, "mine");
            assert!(visible(&table, t, &version), "level {}", level);
        }
    }

    #[test]
    fn test_own_close_hides_version() {
        let mut table = TransactionTable::new();
        let t = table.register(IsolationLevel::ReadCommitted);
        let mut version = Version::new(t, "mine");
        version.close(t);

        let tx = table.get(t).unwrap();
        assert_eq!(
            Visibility::explain(tx, &version, &table).unwrap(),
            VisibilityReason::ClosedBySelf
        );
    }

    #[test]
    fn test_aborted_creator_never_visible() {
        for level in IsolationLevel::ALL {
            let mut table = TransactionTable::new();
            let writer = table.register(IsolationLevel::ReadCommitted);
            abort(&mut table, writer);
            let reader = table.register(level);
            let version = Version::new(writer, "ghost");
            assert!(!visible(&table, reader, &version), "level {}", level);
        }
    }

    #[test]
    fn test_in_progress_creator_visible_only_to_read_uncommitted() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        let version = Version::new(writer, "dirty");

        for level in IsolationLevel::ALL {
            let reader = table.register(level);
            let expected = level == IsolationLevel::ReadUncommitted;
            assert_eq!(visible(&table, reader, &version), expected, "level {}", level);
        }
    }

    #[test]
    fn test_read_committed_sees_commits_after_begin() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        let reader = table.register(IsolationLevel::ReadCommitted);
        let version = Version::new(writer, "v");

        assert!(!visible(&table, reader, &version));
        commit(&mut table, writer);
        assert!(visible(&table, reader, &version));
    }

    #[test]
    fn test_repeatable_read_ignores_commits_of_snapshot_members() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        let reader = table.register(IsolationLevel::RepeatableRead);
        let version = Version::new(writer, "v");

        commit(&mut table, writer);
        assert!(!visible(&table, reader, &version));
    }

    #[test]
    fn test_repeatable_read_ignores_later_transactions() {
        let mut table = TransactionTable::new();
        let reader = table.register(IsolationLevel::RepeatableRead);
        let writer = table.register(IsolationLevel::ReadCommitted);
        let version = Version::new(writer, "v");

        commit(&mut table, writer);
        assert!(!visible(&table, reader, &version));
    }

    #[test]
    fn test_repeatable_read_sees_commits_before_begin() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, writer);
        let reader = table.register(IsolationLevel::Serializable);
        let version = Version::new(writer, "v");

        assert!(visible(&table, reader, &version));
    }

    #[test]
    fn test_close_by_aborted_transaction_is_ignored() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, writer);
        let closer = table.register(IsolationLevel::ReadCommitted);
        let mut version = Version::new(writer, "v");
        version.close(closer);
        abort(&mut table, closer);

        let reader = table.register(IsolationLevel::ReadCommitted);
        let tx = table.get(reader).unwrap();
        assert_eq!(
            Visibility::explain(tx, &version, &table).unwrap(),
            VisibilityReason::ClosedByHidden
        );
    }

    #[test]
    fn test_close_by_committed_transaction_hides_version() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, writer);
        let closer = table.register(IsolationLevel::ReadCommitted);
        let mut version = Version::new(writer, "v");
        version.close(closer);
        commit(&mut table, closer);

        let reader = table.register(IsolationLevel::ReadCommitted);
        assert!(!visible(&table, reader, &version));
    }

    #[test]
    fn test_any_visible_closer_hides_version() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, writer);
        let first = table.register(IsolationLevel::ReadCommitted);
        let second = table.register(IsolationLevel::ReadCommitted);
        let mut version = Version::new(writer, "v");
        version.close(first);
        version.close(second);
        commit(&mut table, first);
        abort(&mut table, second);

        let reader = table.register(IsolationLevel::ReadCommitted);
        let tx = table.get(reader).unwrap();
        assert_eq!(
            Visibility::explain(tx, &version, &table).unwrap(),
            VisibilityReason::ClosedByVisible
        );
    }

    #[test]
    fn test_second_closer_sees_own_close() {
        let mut table = TransactionTable::new();
        let writer = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, writer);
        let first = table.register(IsolationLevel::ReadCommitted);
        let second = table.register(IsolationLevel::ReadCommitted);
        let mut version = Version::new(writer, "v");
        version.close(first);
        version.close(second);

        let tx = table.get(second).unwrap();
        assert_eq!(
            Visibility::explain(tx, &version, &table).unwrap(),
            VisibilityReason::ClosedBySelf
        );
    }

    #[test]
    fn test_visible_version_with_reports_each_step() {
        let mut table = TransactionTable::new();
        let t1 = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, t1);
        let pending = table.register(IsolationLevel::ReadCommitted);

        let chain = vec![Version::new(t1, "old"), Version::new(pending, "dirty")];
        let reader = table.register(IsolationLevel::ReadCommitted);
        let tx = table.get(reader).unwrap();

        let mut seen = Vec::new();
        let result = Visibility::visible_version_with(tx, &chain, &table, |v, reason| {
            seen.push((v.payload().to_string(), reason));
        })
        .unwrap();

        assert_eq!(result.version().unwrap().payload(), "old");
        assert_eq!(
            seen,
            vec![
                ("dirty".to_string(), VisibilityReason::CreatorHidden),
                ("old".to_string(), VisibilityReason::Open),
            ]
        );
    }

    #[test]
    fn test_visible_version_scans_newest_first() {
        let mut table = TransactionTable::new();
        let t1 = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, t1);
        let t2 = table.register(IsolationLevel::ReadCommitted);
        commit(&mut table, t2);

        let chain = vec![Version::new(t1, "old"), Version::new(t2, "new")];
        let reader = table.register(IsolationLevel::ReadCommitted);
        let tx = table.get(reader).unwrap();

        let result = Visibility::visible_version(tx, &chain, &table).unwrap();
        assert_eq!(result.version().unwrap().payload(), "new");
    }

    #[test]
    fn test_empty_chain_invisible() {
        let mut table = TransactionTable::new();
        let reader = table.register(IsolationLevel::ReadCommitted);
        let tx = table.get(reader).unwrap();
        let result = Visibility::visible_version(tx, &[], &table).unwrap();
        assert!(!result.is_visible());
    }

    #[test]
    fn test_unknown_creator_is_corruption() {
        let mut table = TransactionTable::new();
        let reader = table.register(IsolationLevel::ReadCommitted);
        let tx = table.get(reader).unwrap();
        let version = Version::new(TxId::new(50), "stray");

        let err = Visibility::version_visible(tx, &version, &table).unwrap_err();
        assert!(err.is_fatal());
    }
}
