//! Record lifetime passed to the backend.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// How long a backend record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ttl {
    /// The record never expires.
    Forever,
    /// The record expires this long after it is written.
    For(Duration),
}

impl Ttl {
    /// Absolute expiry for a record written at `now`, or `None` for
    /// [`Ttl::Forever`] and lifetimes too large to represent.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Forever => None,
            Self::For(duration) => TimeDelta::from_std(*duration)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta)),
        }
    }

    /// Lifetime remaining until `expires`, measured from `now`. An instant
    /// already in the past yields a zero lifetime.
    pub fn until(expires: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::For((expires - now).to_std().unwrap_or(Duration::ZERO))
    }
}
