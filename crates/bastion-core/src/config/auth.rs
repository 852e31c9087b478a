//! Authentication configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Credential, lockout and session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Consecutive failed sign-ins tolerated inside the lockout window;
    /// one more locks the account.
    #[serde(default = "default_max_attempts")]
    pub max_login_attempts: u32,
    /// Account lock interval (and failure window) in minutes.
    #[serde(default = "default_lock_interval")]
    pub account_lock_interval_minutes: u64,
    /// Web session lifetime in hours.
    #[serde(default = "default_session_ttl")]
    pub web_session_ttl_hours: u64,
    /// Host certificate lifetime in hours. `0` issues certificates without
    /// an upper validity bound.
    #[serde(default)]
    pub host_cert_ttl_hours: u64,
}

impl AuthConfig {
    /// Lockout interval as a [`Duration`].
    pub fn account_lock_interval(&self) -> Duration {
        Duration::from_secs(self.account_lock_interval_minutes * 60)
    }

    /// Web session lifetime as a [`Duration`].
    pub fn web_session_ttl(&self) -> Duration {
        Duration::from_secs(self.web_session_ttl_hours * 3600)
    }

    /// Host certificate lifetime, or `None` when unbounded.
    pub fn host_cert_ttl(&self) -> Option<Duration> {
        (self.host_cert_ttl_hours > 0).then(|| Duration::from_secs(self.host_cert_ttl_hours * 3600))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: default_max_attempts(),
            account_lock_interval_minutes: default_lock_interval(),
            web_session_ttl_hours: default_session_ttl(),
            host_cert_ttl_hours: 0,
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lock_interval() -> u64 {
    20
}

fn default_session_ttl() -> u64 {
    12
}
