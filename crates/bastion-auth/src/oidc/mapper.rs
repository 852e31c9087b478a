//! Claim-to-role mapping for OIDC connectors.

use std::time::Duration;

use tracing::{debug, info};

use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_entity::oidc::{Claims, MappingAction, OidcConnector, RoleTemplate};
use bastion_entity::role::{Role, RoleSpec};

use crate::role::RoleStore;

use super::template::render;

/// Session lifetime of every role rendered from a template.
///
/// The template's own `max_session_ttl` and `node_labels` are not applied.
pub const DEFAULT_TEMPLATED_ROLE_TTL: Duration = Duration::from_secs(30 * 60 * 60);

/// Turns provider claims into role names, materialising templated roles.
#[derive(Debug, Clone)]
pub struct IdentityMapper {
    roles: RoleStore,
}

impl IdentityMapper {
    /// Creates a mapper that stores templated roles in `roles`.
    pub fn new(roles: RoleStore) -> Self {
        Self { roles }
    }

    /// Walks the connector's mappings in order and collects the roles of
    /// every one whose claim matches.
    ///
    /// Templated roles are rendered and upserted before their name is
    /// added. Names are not deduplicated. No match yields an empty list.
    pub async fn build_roles(
        &self,
        connector: &OidcConnector,
        claims: &Claims,
    ) -> AppResult<Vec<String>> {
        let mut names = Vec::new();
        for mapping in &connector.claims_to_roles {
            if !claims.matches(&mapping.claim, &mapping.value) {
                continue;
            }
            match &mapping.action {
                MappingAction::Roles(roles) => names.extend(roles.iter().cloned()),
                MappingAction::Template(template) => {
                    let role = render_role(template, claims)?;
                    self.roles.upsert_role(&role).await?;
                    info!(
                        connector = %connector.name,
                        role = %role.name,
                        "Role created from template"
                    );
                    names.push(role.name);
                }
            }
        }
        debug!(connector = %connector.name, roles = ?names, "Claims mapped to roles");
        Ok(names)
    }

    /// Renders the first matching templated mapping without storing it.
    pub fn role_from_template(&self, connector: &OidcConnector, claims: &Claims) -> AppResult<Role> {
        connector
            .claims_to_roles
            .iter()
            .filter(|mapping| claims.matches(&mapping.claim, &mapping.value))
            .find_map(|mapping| match &mapping.action {
                MappingAction::Template(template) => Some(template),
                MappingAction::Roles(_) => None,
            })
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No role template of connector '{}' matches the claims",
                    connector.name
                ))
            })
            .and_then(|template| render_role(template, claims))
    }
}

fn render_role(template: &RoleTemplate, claims: &Claims) -> AppResult<Role> {
    let name = render(&template.name, claims)?;
    if name.trim().is_empty() {
        return Err(AppError::template_render(format!(
            "Role template '{}' rendered an empty name",
            template.name
        )));
    }
    let logins = template
        .logins
        .iter()
        .map(|login| render(login, claims))
        .collect::<AppResult<Vec<_>>>()?;

    Role::new(
        name,
        RoleSpec {
            max_session_ttl: DEFAULT_TEMPLATED_ROLE_TTL,
            logins,
            ..RoleSpec::default()
        },
    )
    .map_err(|e| AppError::template_render(e.message))
}
