//! Role store.

use std::sync::Arc;

use tracing::info;

use bastion_backend::keys;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, BackendExt};
use bastion_core::types::Ttl;
use bastion_entity::role::Role;

/// Persists roles by name. Writes replace the whole role.
#[derive(Debug, Clone)]
pub struct RoleStore {
    backend: Arc<dyn Backend>,
}

impl RoleStore {
    /// Creates a role store over `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Creates or replaces a role.
    pub async fn upsert_role(&self, role: &Role) -> AppResult<()> {
        role.check()?;
        self.backend
            .put_json(&keys::role(&role.name), role, Ttl::Forever)
            .await?;
        info!(role = %role.name, "Role stored");
        Ok(())
    }

    /// Loads a role by name.
    pub async fn get_role(&self, name: &str) -> AppResult<Role> {
        self.backend
            .get_json(&keys::role(name))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
    }

    /// Loads every role, ordered by name.
    pub async fn get_roles(&self) -> AppResult<Vec<Role>> {
        self.backend.list_json(&keys::roles()).await
    }

    /// Deletes a role.
    pub async fn delete_role(&self, name: &str) -> AppResult<()> {
        if !self.backend.delete(&keys::role(name)).await? {
            return Err(AppError::not_found(format!("Role '{name}' not found")));
        }
        info!(role = %name, "Role deleted");
        Ok(())
    }
}
