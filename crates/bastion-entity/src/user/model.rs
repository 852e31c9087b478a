//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user known to the cluster.
///
/// Password hashes live under a separate key and never on this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique login name.
    pub name: String,
    /// Names of the roles assigned to the user.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Set when the user was created by a federated login.
    #[serde(default)]
    pub created_by: Option<ConnectorIdentity>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// Identity asserted by an external connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorIdentity {
    /// Connector that asserted the identity.
    pub connector: String,
    /// Identity (email) reported by the provider.
    pub email: String,
}
