//! Web session persistence.

use std::sync::Arc;

use bastion_backend::keys;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, BackendExt};
use bastion_core::types::Ttl;
use bastion_entity::session::WebSession;

/// Stores web sessions keyed by user and session id.
///
/// Records carry a backend TTL equal to the session lifetime, so expired
/// sessions read as absent.
#[derive(Debug, Clone)]
pub struct WebSessionStore {
    backend: Arc<dyn Backend>,
}

impl WebSessionStore {
    /// Creates a session store over `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Persists a session.
    pub async fn create(&self, session: &WebSession, ttl: Ttl) -> AppResult<()> {
        self.backend
            .put_json(&keys::web_session(&session.user, &session.id), session, ttl)
            .await
    }

    /// Loads a session.
    pub async fn get(&self, user: &str, id: &str) -> AppResult<WebSession> {
        self.backend
            .get_json(&keys::web_session(user, id))
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Web session '{id}' of user '{user}' not found"))
            })
    }

    /// Removes a session. Returns `false` if it was already gone.
    pub async fn delete(&self, user: &str, id: &str) -> AppResult<bool> {
        self.backend.delete(&keys::web_session(user, id)).await
    }

    /// Lists the live sessions of a user.
    pub async fn list(&self, user: &str) -> AppResult<Vec<WebSession>> {
        self.backend.list_json(&keys::web_sessions(user)).await
    }
}
