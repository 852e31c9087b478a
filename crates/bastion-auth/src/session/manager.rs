//! Sign-in and web session lifecycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::{info, warn};

use bastion_backend::keys;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, Clock};
use bastion_core::types::Ttl;
use bastion_entity::authority::SignedCertificate;
use bastion_entity::session::{LoginAttempts, WebSession};

use crate::authority::keys::generate_key_pair;
use crate::authority::{AuthorityStore, UserCertRequest};
use crate::password::PasswordHasher;
use crate::role::RoleStore;
use crate::user::UserStore;
use crate::user::store::check_user_name;

use super::lockout::{LockoutPolicy, LockoutTracker};
use super::store::WebSessionStore;

/// Verifies passwords, enforces lockout and issues web sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    authorities: AuthorityStore,
    roles: RoleStore,
    users: UserStore,
    sessions: WebSessionStore,
    lockout: LockoutTracker,
    hasher: PasswordHasher,
    session_ttl: Duration,
}

impl SessionManager {
    /// Creates a session manager. Sessions live for `session_ttl` unless a
    /// role of the user caps them lower.
    pub fn new(
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        authorities: AuthorityStore,
        roles: RoleStore,
        users: UserStore,
        policy: LockoutPolicy,
        session_ttl: Duration,
    ) -> Self {
        Self {
            sessions: WebSessionStore::new(backend.clone()),
            lockout: LockoutTracker::new(backend.clone(), clock.clone(), policy),
            hasher: PasswordHasher::new(),
            backend,
            clock,
            authorities,
            roles,
            users,
            session_ttl,
        }
    }

    /// Sets the password of `user`, replacing any previous one and clearing
    /// its failed attempts.
    pub async fn upsert_password(&self, user: &str, password: &str) -> AppResult<()> {
        check_user_name(user)?;
        let hash = self.hasher.hash_password(password)?;
        self.backend
            .put(&keys::password(user), &hash, Ttl::Forever)
            .await?;
        self.lockout.reset(user).await?;
        info!(user = %user, "Password updated");
        Ok(())
    }

    /// Authenticates `user` with a password and opens a web session.
    ///
    /// While the account is locked every attempt fails with `AccountLocked`,
    /// whatever the password. Each attempt is reserved with the lockout
    /// tracker before the password is checked.
    pub async fn sign_in(&self, user: &str, password: &str) -> AppResult<WebSession> {
        let hash = self
            .backend
            .get(&keys::password(user))
            .await?
            .ok_or_else(|| AppError::user_not_found(format!("User '{user}' has no credentials")))?;

        let attempt = self.lockout.reserve_attempt(user).await?;
        if !self.hasher.verify_password(password, &hash)? {
            warn!(user = %user, failures = attempt.failures, "Failed sign-in");
            return Err(AppError::invalid_credentials(format!(
                "Invalid password for user '{user}'"
            )));
        }

        self.lockout.reset(user).await?;
        let session = self.create_web_session(user).await?;
        info!(user = %user, session_id = %session.id, "Sign-in successful");
        Ok(session)
    }

    /// Opens a web session for `user` without checking credentials.
    ///
    /// The session certificate grants the user name plus the logins of the
    /// user's roles.
    pub async fn create_web_session(&self, user: &str) -> AppResult<WebSession> {
        check_user_name(user)?;
        let (principals, ttl) = self.session_grants(user).await?;
        let pair = generate_key_pair();
        let cert = self
            .authorities
            .generate_user_cert(&UserCertRequest {
                username: user.to_string(),
                principals,
                public_key: pair.public_key,
                ttl,
            })
            .await?;

        let now = self.clock.now();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AppError::validation(format!("Session TTL {ttl:?} is out of range")))?;
        let session = WebSession {
            id: hex::encode(rand::random::<[u8; 32]>()),
            user: user.to_string(),
            bearer_token: hex::encode(rand::random::<[u8; 32]>()),
            private_key: pair.private_key,
            certificate: cert.encode()?,
            created_at: now,
            expires_at,
        };
        self.sessions.create(&session, Ttl::For(ttl)).await?;
        info!(user = %user, session_id = %session.id, "Web session created");
        Ok(session)
    }

    /// Loads a session including its secrets.
    pub async fn get_web_session(&self, user: &str, id: &str) -> AppResult<WebSession> {
        self.sessions.get(user, id).await
    }

    /// Loads a session with bearer token and private key removed.
    pub async fn get_web_session_info(&self, user: &str, id: &str) -> AppResult<WebSession> {
        Ok(self.sessions.get(user, id).await?.without_secrets())
    }

    /// Lists the live sessions of `user` without their secrets.
    pub async fn get_web_sessions(&self, user: &str) -> AppResult<Vec<WebSession>> {
        Ok(self
            .sessions
            .list(user)
            .await?
            .iter()
            .map(WebSession::without_secrets)
            .collect())
    }

    /// Ends a session. Deleting a missing session succeeds.
    pub async fn delete_web_session(&self, user: &str, id: &str) -> AppResult<()> {
        if self.sessions.delete(user, id).await? {
            info!(user = %user, session_id = %id, "Web session deleted");
        }
        Ok(())
    }

    /// Failed sign-in state of `user`.
    pub async fn get_login_attempts(&self, user: &str) -> AppResult<LoginAttempts> {
        self.lockout.attempts(user).await
    }

    /// Principals and lifetime of a new session for `user`.
    async fn session_grants(&self, user: &str) -> AppResult<(Vec<String>, Duration)> {
        let mut principals = vec![user.to_string()];
        let mut ttl = self.session_ttl;

        let Some(record) = self.users.find_user(user).await? else {
            return Ok((principals, ttl));
        };
        for name in &record.roles {
            let role = match self.roles.get_role(name).await {
                Ok(role) => role,
                Err(e) if e.is_not_found() => {
                    warn!(user = %user, role = %name, "User references a missing role");
                    continue;
                }
                Err(e) => return Err(e),
            };
            for login in role.spec.logins {
                if !principals.contains(&login) {
                    principals.push(login);
                }
            }
            if !role.spec.max_session_ttl.is_zero() {
                ttl = ttl.min(role.spec.max_session_ttl);
            }
        }
        Ok((principals, ttl))
    }
}
