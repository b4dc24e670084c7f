//! Engine configuration
//!
//! Fixed when the database is created; there is no runtime reconfiguration.

use serde::{Deserialize, Serialize};

use crate::mvcc::IsolationLevel;

/// Settings that shape engine behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Level applied when `begin` is called without one.
    #[serde(default)]
    pub default_isolation: IsolationLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_isolation: IsolationLevel::ReadCommitted,
        }
    }
}

impl EngineConfig {
    /// Config with a specific default isolation level.
    pub fn with_default_isolation(level: IsolationLevel) -> Self {
        Self {
            default_isolation: level,
        }
    }
}
