//! Cluster system roles a node may join with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Role a cluster member (not a user) plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemRole {
    /// Auth server.
    Auth,
    /// SSH node.
    Node,
    /// Proxy server.
    Proxy,
    /// Web service.
    Web,
    /// Cluster administrator.
    Admin,
}

impl SystemRole {
    /// Return the canonical role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "Auth",
            Self::Node => "Node",
            Self::Proxy => "Proxy",
            Self::Web => "Web",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "node" => Ok(Self::Node),
            "proxy" => Ok(Self::Proxy),
            "web" => Ok(Self::Web),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::validation(format!(
                "Invalid system role: '{s}'. Expected one of: auth, node, proxy, web, admin"
            ))),
        }
    }
}

/// An ordered set of system roles without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roles(Vec<SystemRole>);

impl Roles {
    /// Build a role set, dropping duplicates while keeping first-seen order.
    pub fn new(roles: impl IntoIterator<Item = SystemRole>) -> Self {
        let mut out = Vec::new();
        for role in roles {
            if !out.contains(&role) {
                out.push(role);
            }
        }
        Self(out)
    }

    /// Whether the set grants `role`.
    pub fn include(&self, role: SystemRole) -> bool {
        self.0.contains(&role)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of roles in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the roles.
    pub fn iter(&self) -> impl Iterator<Item = &SystemRole> {
        self.0.iter()
    }
}

impl From<Vec<SystemRole>> for Roles {
    fn from(roles: Vec<SystemRole>) -> Self {
        Self::new(roles)
    }
}

impl fmt::Display for Roles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(SystemRole::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}

impl FromStr for Roles {
    type Err = AppError;

    /// Parses a comma-separated list such as `"proxy,node"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let roles = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(SystemRole::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("proxy".parse::<SystemRole>().unwrap(), SystemRole::Proxy);
        assert_eq!("NODE".parse::<SystemRole>().unwrap(), SystemRole::Node);
        assert!("bastion".parse::<SystemRole>().is_err());
    }

    #[test]
    fn test_roles_list() {
        let roles: Roles = "proxy, node,proxy".parse().unwrap();
        assert_eq!(roles.len(), 2);
        assert!(roles.include(SystemRole::Proxy));
        assert!(roles.include(SystemRole::Node));
        assert!(!roles.include(SystemRole::Auth));
        assert_eq!(roles.to_string(), "Proxy,Node");
    }

    #[test]
    fn test_empty_list() {
        let roles: Roles = "".parse().unwrap();
        assert!(roles.is_empty());
    }
}
