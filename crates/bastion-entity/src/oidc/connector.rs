//! OIDC connector entity model.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use bastion_core::config::{ClaimMappingConfig, OidcConnectorConfig};
use bastion_core::error::AppError;

/// An external identity provider and the rules mapping its claims to roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConnector {
    /// Connector name.
    pub name: String,
    /// Provider issuer URL.
    pub issuer_url: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Callback URL.
    pub redirect_url: String,
    /// Login button label.
    #[serde(default)]
    pub display: String,
    /// Requested scopes.
    #[serde(default)]
    pub scope: Vec<String>,
    /// Ordered claim-to-role rules.
    pub claims_to_roles: Vec<ClaimMapping>,
}

/// One claim-to-role rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMapping {
    /// Claim name to inspect.
    pub claim: String,
    /// Value that triggers the rule.
    pub value: String,
    /// What a match yields.
    pub action: MappingAction,
}

/// Outcome of a matching claim rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingAction {
    /// Pre-existing roles granted as-is.
    Roles(Vec<String>),
    /// A role rendered from the claims and persisted.
    Template(RoleTemplate),
}

/// A parametrized role definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTemplate {
    /// Role name template.
    pub name: String,
    /// Login templates.
    #[serde(default)]
    pub logins: Vec<String>,
    /// Requested max session lifetime. Not applied when rendering.
    #[serde(default)]
    pub max_session_ttl: Option<Duration>,
    /// Requested node label constraints. Not applied when rendering.
    #[serde(default)]
    pub node_labels: BTreeMap<String, String>,
}

impl OidcConnector {
    /// Validate the connector definition.
    pub fn check(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() || self.name.contains('/') {
            return Err(AppError::validation(format!(
                "Invalid connector name '{}'",
                self.name
            )));
        }
        Url::parse(&self.issuer_url).map_err(|e| {
            AppError::validation(format!(
                "Connector '{}': invalid issuer_url '{}': {e}",
                self.name, self.issuer_url
            ))
        })?;
        Url::parse(&self.redirect_url).map_err(|e| {
            AppError::validation(format!(
                "Connector '{}': invalid redirect_url '{}': {e}",
                self.name, self.redirect_url
            ))
        })?;
        if self.client_id.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Connector '{}': client_id is required",
                self.name
            )));
        }
        if self.claims_to_roles.is_empty() {
            return Err(AppError::validation(format!(
                "Connector '{}': at least one claim mapping is required",
                self.name
            )));
        }
        for mapping in &self.claims_to_roles {
            mapping.check(&self.name)?;
        }
        Ok(())
    }

    /// Copy of the connector with the client secret removed.
    pub fn without_secrets(&self) -> Self {
        Self {
            client_secret: String::new(),
            ..self.clone()
        }
    }
}

impl ClaimMapping {
    fn check(&self, connector: &str) -> Result<(), AppError> {
        if self.claim.trim().is_empty() || self.value.is_empty() {
            return Err(AppError::validation(format!(
                "Connector '{connector}': claim mappings need both a claim and a value"
            )));
        }
        match &self.action {
            MappingAction::Roles(roles) if roles.is_empty() => Err(AppError::validation(format!(
                "Connector '{connector}': mapping for claim '{}' grants no roles",
                self.claim
            ))),
            MappingAction::Template(template) if template.name.trim().is_empty() => {
                Err(AppError::validation(format!(
                    "Connector '{connector}': role template for claim '{}' has no name",
                    self.claim
                )))
            }
            _ => Ok(()),
        }
    }
}

impl TryFrom<ClaimMappingConfig> for ClaimMapping {
    type Error = AppError;

    fn try_from(config: ClaimMappingConfig) -> Result<Self, Self::Error> {
        let action = match (config.roles.is_empty(), config.role_template) {
            (false, None) => MappingAction::Roles(config.roles),
            (true, Some(template)) => MappingAction::Template(RoleTemplate {
                name: template.name,
                logins: template.logins,
                max_session_ttl: template
                    .max_session_ttl_hours
                    .map(|hours| Duration::from_secs(hours * 3600)),
                node_labels: template.node_labels,
            }),
            (false, Some(_)) => {
                return Err(AppError::configuration(format!(
                    "Claim mapping for '{}' sets both roles and role_template",
                    config.claim
                )));
            }
            (true, None) => {
                return Err(AppError::configuration(format!(
                    "Claim mapping for '{}' sets neither roles nor role_template",
                    config.claim
                )));
            }
        };

        Ok(Self {
            claim: config.claim,
            value: config.value,
            action,
        })
    }
}

impl TryFrom<OidcConnectorConfig> for OidcConnector {
    type Error = AppError;

    fn try_from(config: OidcConnectorConfig) -> Result<Self, Self::Error> {
        let claims_to_roles = config
            .claims_to_roles
            .into_iter()
            .map(ClaimMapping::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name,
            issuer_url: config.issuer_url,
            client_id: config.client_id,
            client_secret: config.client_secret,
            redirect_url: config.redirect_url,
            display: config.display,
            scope: config.scope,
            claims_to_roles,
        })
    }
}
