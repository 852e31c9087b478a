//! Per-user failed sign-in bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Consecutive failed sign-ins for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempts {
    /// Consecutive failures inside the current window.
    pub failures: u32,
    /// Instant of the most recent failure.
    pub last_failure: Option<DateTime<Utc>>,
    /// Sign-in is refused until this instant.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttempts {
    /// Whether the account is locked at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}
