//! Web session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A browser/API session created on successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSession {
    /// Session identifier, unique per user.
    pub id: String,
    /// Owner of the session.
    pub user: String,
    /// Bearer token presented on subsequent requests.
    pub bearer_token: String,
    /// Base64 private key of the session key pair.
    pub private_key: String,
    /// Encoded user certificate signed by the user authority.
    pub certificate: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

impl WebSession {
    /// Copy of the session with secret material removed.
    pub fn without_secrets(&self) -> Self {
        Self {
            bearer_token: String::new(),
            private_key: String::new(),
            ..self.clone()
        }
    }

    /// Whether the session has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
