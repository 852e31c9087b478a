//! User store.

use std::sync::Arc;

use tracing::info;

use bastion_backend::keys;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, BackendExt};
use bastion_core::types::Ttl;
use bastion_entity::user::User;

/// Persists user records. Credentials, attempts and sessions live under
/// their own keys but are removed together with the user.
#[derive(Debug, Clone)]
pub struct UserStore {
    backend: Arc<dyn Backend>,
}

impl UserStore {
    /// Creates a user store over `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Creates or replaces a user record.
    pub async fn upsert_user(&self, user: &User) -> AppResult<()> {
        check_user_name(&user.name)?;
        self.backend
            .put_json(&keys::user(&user.name), user, Ttl::Forever)
            .await?;
        info!(user = %user.name, roles = ?user.roles, "User stored");
        Ok(())
    }

    /// Loads a user record.
    pub async fn get_user(&self, name: &str) -> AppResult<User> {
        self.find_user(name)
            .await?
            .ok_or_else(|| AppError::user_not_found(format!("User '{name}' not found")))
    }

    /// Loads a user record if one exists.
    pub async fn find_user(&self, name: &str) -> AppResult<Option<User>> {
        self.backend.get_json(&keys::user(name)).await
    }

    /// Loads every user, ordered by name.
    pub async fn get_users(&self) -> AppResult<Vec<User>> {
        self.backend.list_json(&keys::users()).await
    }

    /// Deletes a user along with its password, lockout state and sessions.
    pub async fn delete_user(&self, name: &str) -> AppResult<()> {
        if !self.backend.delete(&keys::user(name)).await? {
            return Err(AppError::user_not_found(format!("User '{name}' not found")));
        }
        self.backend.delete(&keys::password(name)).await?;
        self.backend.delete(&keys::login_attempts(name)).await?;
        for (key, _) in self.backend.list(&keys::web_sessions(name)).await? {
            self.backend.delete(&key).await?;
        }
        info!(user = %name, "User deleted");
        Ok(())
    }
}

/// User names are embedded in backend keys.
pub(crate) fn check_user_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() || name.contains('/') {
        return Err(AppError::validation(format!("Invalid user name '{name}'")));
    }
    Ok(())
}
