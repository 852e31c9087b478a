//! Provisioning token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bastion_core::types::Roles;

/// Longest token value accepted.
pub const MAX_TOKEN_LEN: usize = 256;

/// Whether `c` may appear in a token value.
pub fn is_token_char(c: char) -> bool {
    !(c.is_whitespace() || c.is_control() || c == '/')
}

/// A bootstrap secret that lets a new node join with a bounded role set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionToken {
    /// The secret value.
    pub token: String,
    /// Roles a node may claim with this token.
    pub roles: Roles,
    /// Expiry instant. Static tokens have none.
    pub expires: Option<DateTime<Utc>>,
    /// Whether the token is deleted after its first successful registration.
    #[serde(default)]
    pub single_use: bool,
}

impl ProvisionToken {
    /// Whether the token is past its expiry instant at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| now >= expires)
    }
}
