//! Failed sign-in tracking and account lockout.
//!
//! A user is locked once the number of failures inside the lock interval
//! exceeds the configured maximum, and unlocked again when the interval has
//! passed since the last failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::warn;

use bastion_backend::keys;
use bastion_core::config::AuthConfig;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, BackendExt, Clock};
use bastion_core::types::Ttl;
use bastion_entity::session::LoginAttempts;

/// Upper bound on compare-and-swap retries for one failure.
const MAX_CAS_RETRIES: usize = 64;

/// Lockout thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures tolerated before the account locks.
    pub max_login_attempts: u32,
    /// How long the account stays locked after the last failure.
    pub lock_interval: Duration,
}

impl LockoutPolicy {
    /// Builds the policy from auth settings.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_login_attempts: config.max_login_attempts,
            lock_interval: config.account_lock_interval(),
        }
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Tracks failed sign-ins per user in the backend.
#[derive(Debug, Clone)]
pub struct LockoutTracker {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
}

impl LockoutTracker {
    /// Creates a tracker.
    pub fn new(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>, policy: LockoutPolicy) -> Self {
        Self {
            backend,
            clock,
            policy,
        }
    }

    /// Current attempt state of `user`; empty when nothing was recorded.
    pub async fn attempts(&self, user: &str) -> AppResult<LoginAttempts> {
        Ok(self
            .backend
            .get_json(&keys::login_attempts(user))
            .await?
            .unwrap_or_default())
    }

    /// Reserves one sign-in attempt for `user` before its password is
    /// checked.
    ///
    /// Fails with `AccountLocked`, and records nothing, while the account is
    /// locked. Otherwise the attempt is counted as a failure up front, so
    /// concurrent sign-ins can not check more passwords than the policy
    /// allows. A successful sign-in clears the record with [`Self::reset`].
    pub async fn reserve_attempt(&self, user: &str) -> AppResult<LoginAttempts> {
        let key = keys::login_attempts(user);
        let interval = TimeDelta::from_std(self.policy.lock_interval)
            .map_err(|e| AppError::configuration(format!("Lock interval out of range: {e}")))?;

        for _ in 0..MAX_CAS_RETRIES {
            let current = self.backend.get(&key).await?;
            let mut attempts: LoginAttempts = match &current {
                Some(json) => serde_json::from_str(json)?,
                None => LoginAttempts::default(),
            };

            let now = self.clock.now();
            if let Some(until) = attempts.locked_until.filter(|_| attempts.is_locked(now)) {
                return Err(AppError::account_locked(format!(
                    "User '{user}' is locked until {}",
                    until.to_rfc3339()
                )));
            }
            if attempts
                .last_failure
                .and_then(|last| last.checked_add_signed(interval))
                .is_some_and(|window_end| now >= window_end)
            {
                attempts = LoginAttempts::default();
            }

            attempts.failures += 1;
            attempts.last_failure = Some(now);
            if attempts.failures > self.policy.max_login_attempts {
                let until = now.checked_add_signed(interval).ok_or_else(|| {
                    AppError::configuration("Lock interval reaches past the supported time range")
                })?;
                attempts.locked_until = Some(until);
            }

            let next = serde_json::to_string(&attempts)?;
            if self
                .backend
                .compare_and_swap(
                    &key,
                    current.as_deref(),
                    &next,
                    Ttl::For(self.policy.lock_interval),
                )
                .await?
            {
                if attempts.locked_until.is_some() {
                    warn!(
                        user = %user,
                        failures = attempts.failures,
                        "Account locked after too many sign-in attempts"
                    );
                }
                return Ok(attempts);
            }
        }

        Err(AppError::storage(format!(
            "Could not record sign-in attempt for '{user}': too much contention"
        )))
    }

    /// Forgets all failures of `user`.
    pub async fn reset(&self, user: &str) -> AppResult<()> {
        self.backend.delete(&keys::login_attempts(user)).await?;
        Ok(())
    }
}
