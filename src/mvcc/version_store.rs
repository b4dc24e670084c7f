//! VersionStore - append-only version chains by key
//!
//! The store's whole mutation surface is `append` and stamping a closer in
//! `close_visible`. Versions are never removed and payloads never change.

use std::collections::BTreeMap;

use super::errors::MvccResult;
use super::{Transaction, TransactionTable, Version, VersionChain, Visibility};

/// Key → version chain.
#[derive(Debug, Default)]
pub struct VersionStore {
    chains: BTreeMap<String, VersionChain>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Versions of `key` in creation order; empty if the key was never written.
    pub fn read(&self, key: &str) -> &[Version] {
        self.chains
            .get(key)
            .map(VersionChain::versions)
            .unwrap_or(&[])
    }

    /// The chain for `key`, if any version was ever written.
    pub fn chain(&self, key: &str) -> Option<&VersionChain> {
        self.chains.get(key)
    }

    /// Appends a version to the chain of `key`.
    pub fn append(&mut self, key: &str, version: Version) {
        self.chains
            .entry(key.to_string())
            .or_insert_with(|| VersionChain::new(key.to_string()))
            .push(version);
    }

    /// Adds `tx` to the closers of every version of `key` currently visible
    /// to it. Closers already stamped by other transactions are kept.
    ///
    /// Returns how many versions were closed. Sequential use closes exactly
    /// one (or zero for a fresh key); more than one is tolerated.
    pub fn close_visible(
        &mut self,
        key: &str,
        tx: &Transaction,
        table: &TransactionTable,
    ) -> MvccResult<usize> {
        let Some(chain) = self.chains.get_mut(key) else {
            return Ok(0);
        };

        let mut closed = 0;
        for version in chain.versions_mut().iter_mut().rev() {
            if Visibility::version_visible(tx, version, table)? {
                version.close(tx.id());
                closed += 1;
            }
        }
        Ok(closed)
    }

    /// Number of keys with at least one version.
    pub fn key_count(&self) -> usize {
        self.chains.len()
    }

    /// Total number of versions across all keys.
    pub fn version_count(&self) -> usize {
        self.chains.values().map(VersionChain::len).sum()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }
}
