//! OIDC connector store.

use std::sync::Arc;

use tracing::info;

use bastion_backend::keys;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, BackendExt};
use bastion_core::types::Ttl;
use bastion_entity::oidc::OidcConnector;

/// Persists validated OIDC connectors by name.
#[derive(Debug, Clone)]
pub struct ConnectorStore {
    backend: Arc<dyn Backend>,
}

impl ConnectorStore {
    /// Creates a connector store over `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Validates and stores a connector, replacing any previous one.
    pub async fn upsert_oidc_connector(&self, connector: &OidcConnector) -> AppResult<()> {
        connector.check()?;
        self.backend
            .put_json(&keys::oidc_connector(&connector.name), connector, Ttl::Forever)
            .await?;
        info!(
            connector = %connector.name,
            mappings = connector.claims_to_roles.len(),
            "OIDC connector stored"
        );
        Ok(())
    }

    /// Loads a connector, including its client secret.
    pub async fn get_oidc_connector(&self, name: &str) -> AppResult<OidcConnector> {
        self.backend
            .get_json(&keys::oidc_connector(name))
            .await?
            .ok_or_else(|| AppError::not_found(format!("OIDC connector '{name}' not found")))
    }

    /// Loads every connector, ordered by name.
    pub async fn get_oidc_connectors(&self, with_secrets: bool) -> AppResult<Vec<OidcConnector>> {
        let connectors: Vec<OidcConnector> =
            self.backend.list_json(&keys::oidc_connectors()).await?;
        Ok(connectors
            .into_iter()
            .map(|c| if with_secrets { c } else { c.without_secrets() })
            .collect())
    }

    /// Deletes a connector.
    pub async fn delete_oidc_connector(&self, name: &str) -> AppResult<()> {
        if !self.backend.delete(&keys::oidc_connector(name)).await? {
            return Err(AppError::not_found(format!(
                "OIDC connector '{name}' not found"
            )));
        }
        info!(connector = %name, "OIDC connector deleted");
        Ok(())
    }
}
