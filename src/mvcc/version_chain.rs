//! VersionChain - Version history for a key
//!
//! - Versions are kept in creation order
//! - Appending never inspects content
//! - No visibility logic lives here; see `Visibility`

use super::Version;

/// The complete version history of a single key.
#[derive(Clone, Debug)]
pub struct VersionChain {
    key: String,
    versions: Vec<Version>,
}

impl VersionChain {
    /// Creates a new empty version chain for the given key.
    pub fn new(key: String) -> Self {
        Self {
            key,
            versions: Vec::new(),
        }
    }

    /// Returns the key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the number of versions in this chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns true if this chain has no versions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Returns all versions in creation order. No visibility filtering.
    #[inline]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub(crate) fn versions_mut(&mut self) -> &mut [Version] {
        &mut self.versions
    }

    /// Appends a version. Structural only.
    pub fn push(&mut self, version: Version) {
        self.versions.push(version);
    }
}
