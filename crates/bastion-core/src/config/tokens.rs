//! Provisioning token configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Provisioning token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Static tokens in `"role1,role2:secret"` form.
    #[serde(default)]
    pub static_tokens: Vec<String>,
    /// Lifetime in minutes of a single-use (ttl = 0) token that is never
    /// redeemed.
    #[serde(default = "default_single_use_ttl")]
    pub single_use_ttl_minutes: u64,
}

impl TokenConfig {
    /// Single-use token lifetime as a [`Duration`].
    pub fn single_use_ttl(&self) -> Duration {
        Duration::from_secs(self.single_use_ttl_minutes * 60)
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            static_tokens: Vec::new(),
            single_use_ttl_minutes: default_single_use_ttl(),
        }
    }
}

fn default_single_use_ttl() -> u64 {
    30
}
