//! Federated identity (OIDC) connector configuration.
//!
//! These are the raw, file-shaped definitions. `bastion-entity` converts
//! them into validated connectors whose claim mappings are a closed
//! two-case variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// OIDC connector section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OidcConfig {
    /// Connectors upserted on bootstrap.
    #[serde(default)]
    pub connectors: Vec<OidcConnectorConfig>,
}

/// A single OIDC connector definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConnectorConfig {
    /// Connector name.
    pub name: String,
    /// Identity provider issuer URL.
    pub issuer_url: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Callback URL registered with the provider.
    pub redirect_url: String,
    /// Label shown on the login button.
    #[serde(default)]
    pub display: String,
    /// Extra scopes requested from the provider.
    #[serde(default)]
    pub scope: Vec<String>,
    /// Ordered claim-to-role rules.
    #[serde(default)]
    pub claims_to_roles: Vec<ClaimMappingConfig>,
}

/// A claim mapping as written in configuration: exactly one of `roles` or
/// `role_template` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimMappingConfig {
    /// Claim name to inspect.
    pub claim: String,
    /// Claim value that triggers the rule.
    pub value: String,
    /// Fixed role names.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Role rendered from claims.
    #[serde(default)]
    pub role_template: Option<RoleTemplateConfig>,
}

/// A role template as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleTemplateConfig {
    /// Role name template.
    pub name: String,
    /// Login templates.
    #[serde(default)]
    pub logins: Vec<String>,
    /// Requested max session lifetime in hours.
    #[serde(default)]
    pub max_session_ttl_hours: Option<u64>,
    /// Requested node label constraints.
    #[serde(default)]
    pub node_labels: BTreeMap<String, String>,
}
