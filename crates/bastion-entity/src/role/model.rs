//! Role entity model.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bastion_core::error::AppError;

/// A named permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role name.
    pub name: String,
    /// What the role grants.
    pub spec: RoleSpec,
}

/// Permissions granted by a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Longest session a holder may open.
    pub max_session_ttl: Duration,
    /// OS logins the holder may assume.
    #[serde(default)]
    pub logins: Vec<String>,
    /// Node label constraints.
    #[serde(default)]
    pub node_labels: BTreeMap<String, String>,
    /// Namespaces the role applies to.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Resource kind → allowed verbs.
    #[serde(default)]
    pub resources: BTreeMap<String, Vec<String>>,
    /// Whether agent forwarding is permitted.
    #[serde(default)]
    pub forward_agent: bool,
}

impl Role {
    /// Create a validated role.
    pub fn new(name: impl Into<String>, spec: RoleSpec) -> Result<Self, AppError> {
        let role = Self {
            name: name.into(),
            spec,
        };
        role.check()?;
        Ok(role)
    }

    /// Validate the role.
    pub fn check(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Role name must not be empty"));
        }
        if self.name.contains('/') {
            return Err(AppError::validation(format!(
                "Role name '{}' must not contain '/'",
                self.name
            )));
        }
        if self.spec.logins.iter().any(|login| login.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "Role '{}' contains an empty login",
                self.name
            )));
        }
        Ok(())
    }
}
