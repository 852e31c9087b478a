//! Backing store configuration.

use serde::{Deserialize, Serialize};

/// Backing store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend type. Only `"memory"` ships with this crate set.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Interval in seconds between sweeps of expired keys.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_purge_interval() -> u64 {
    60
}
