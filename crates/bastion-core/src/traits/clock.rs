//! Time source injected into every component.
//!
//! Token expiry and account lockout are evaluated against [`Clock::now`],
//! never against the wall clock directly, so tests can move time with
//! [`FakeClock`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;

/// A source of the current instant.
pub trait Clock: Send + Sync + std::fmt::Debug + 'static {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FakeClock {
    /// Creates a clock frozen at `at`.
    pub fn new_at(at: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(at)),
        }
    }

    /// Creates a clock frozen at the current wall-clock time.
    pub fn new() -> Self {
        Self::new_at(Utc::now())
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.write();
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Sets the clock to an arbitrary instant.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.write() = at;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
