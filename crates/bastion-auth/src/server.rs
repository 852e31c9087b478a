//! The auth server façade every caller goes through.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use bastion_core::config::{AppConfig, AuthConfig, OidcConnectorConfig, TokenConfig};
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, Clock};
use bastion_core::types::{Roles, Ttl};
use bastion_entity::authority::{
    CertAuthType, CertAuthority, HostCertificate, PackedKeys, UserCertificate,
};
use bastion_entity::oidc::{Claims, OidcConnector};
use bastion_entity::role::Role;
use bastion_entity::session::{LoginAttempts, WebSession};
use bastion_entity::token::ProvisionToken;
use bastion_entity::user::{ConnectorIdentity, User};

use crate::authority::{AuthorityStore, HostCertRequest, UserCertRequest};
use crate::connector::ConnectorStore;
use crate::oidc::IdentityMapper;
use crate::provision::{RegisterRequest, StaticTokens, TokenRegistry};
use crate::role::RoleStore;
use crate::session::{LockoutPolicy, SessionManager};
use crate::user::UserStore;

/// Settings the auth server needs from the application configuration.
#[derive(Debug, Clone)]
pub struct AuthServerConfig {
    /// Name of the local cluster.
    pub cluster_name: String,
    /// Credential, lockout and session settings.
    pub auth: AuthConfig,
    /// Provisioning token settings.
    pub tokens: TokenConfig,
    /// Connectors upserted by [`AuthServer::bootstrap`].
    pub oidc_connectors: Vec<OidcConnectorConfig>,
}

impl AuthServerConfig {
    /// Settings for `cluster_name` with every other value defaulted.
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            auth: AuthConfig::default(),
            tokens: TokenConfig::default(),
            oidc_connectors: Vec::new(),
        }
    }
}

impl From<&AppConfig> for AuthServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            cluster_name: config.cluster.name.clone(),
            auth: config.auth.clone(),
            tokens: config.tokens.clone(),
            oidc_connectors: config.oidc.connectors.clone(),
        }
    }
}

/// Outcome of a completed OIDC login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcAuthResponse {
    /// Name of the signed-in user.
    pub username: String,
    /// Roles granted by the connector's mappings.
    pub roles: Vec<String>,
    /// The session opened for the user.
    pub session: WebSession,
}

/// Trust-and-identity core of one cluster.
///
/// Cheap to clone; all clones share the backend.
#[derive(Debug, Clone)]
pub struct AuthServer {
    config: Arc<AuthServerConfig>,
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    authorities: AuthorityStore,
    tokens: TokenRegistry,
    sessions: SessionManager,
    roles: RoleStore,
    users: UserStore,
    connectors: ConnectorStore,
    mapper: IdentityMapper,
}

impl AuthServer {
    /// Wires all components over `backend` and `clock`.
    ///
    /// Fails if the configured static tokens are invalid.
    pub fn new(
        config: AuthServerConfig,
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let authorities = AuthorityStore::new(
            backend.clone(),
            clock.clone(),
            config.cluster_name.clone(),
            config.auth.host_cert_ttl(),
        );
        let tokens = TokenRegistry::new(
            backend.clone(),
            clock.clone(),
            authorities.clone(),
            StaticTokens::from_config(&config.tokens.static_tokens)?,
            config.tokens.single_use_ttl(),
        );
        let roles = RoleStore::new(backend.clone());
        let users = UserStore::new(backend.clone());
        let sessions = SessionManager::new(
            backend.clone(),
            clock.clone(),
            authorities.clone(),
            roles.clone(),
            users.clone(),
            LockoutPolicy::from_config(&config.auth),
            config.auth.web_session_ttl(),
        );

        Ok(Self {
            connectors: ConnectorStore::new(backend.clone()),
            mapper: IdentityMapper::new(roles.clone()),
            config: Arc::new(config),
            backend,
            clock,
            authorities,
            tokens,
            sessions,
            roles,
            users,
        })
    }

    /// Name of the local cluster.
    pub fn cluster_name(&self) -> &str {
        &self.config.cluster_name
    }

    /// The injected clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Whether the backend is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.backend.health_check().await
    }

    /// Makes sure the local cluster has host and user authorities and that
    /// the configured connectors are stored.
    pub async fn bootstrap(&self) -> AppResult<()> {
        let cluster = self.cluster_name().to_string();
        for kind in [CertAuthType::Host, CertAuthType::User] {
            match self.authorities.get_cert_authority(kind, &cluster, false).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    self.authorities.generate_cert_authority(kind, &cluster).await?;
                    info!(kind = %kind, cluster = %cluster, "Generated certificate authority");
                }
                Err(e) => return Err(e),
            }
        }

        for definition in &self.config.oidc_connectors {
            let connector = OidcConnector::try_from(definition.clone())?;
            self.connectors.upsert_oidc_connector(&connector).await?;
        }
        info!(cluster = %cluster, "Auth server bootstrapped");
        Ok(())
    }

    // ── Certificate authorities ────────────────────────────

    /// See [`AuthorityStore::upsert_cert_authority`].
    pub async fn upsert_cert_authority(&self, ca: &CertAuthority, ttl: Ttl) -> AppResult<()> {
        self.authorities.upsert_cert_authority(ca, ttl).await
    }

    /// See [`AuthorityStore::get_cert_authority`].
    pub async fn get_cert_authority(
        &self,
        kind: CertAuthType,
        cluster_name: &str,
        load_signing_keys: bool,
    ) -> AppResult<CertAuthority> {
        self.authorities
            .get_cert_authority(kind, cluster_name, load_signing_keys)
            .await
    }

    /// See [`AuthorityStore::get_cert_authorities`].
    pub async fn get_cert_authorities(
        &self,
        kind: CertAuthType,
        load_signing_keys: bool,
    ) -> AppResult<Vec<CertAuthority>> {
        self.authorities
            .get_cert_authorities(kind, load_signing_keys)
            .await
    }

    /// See [`AuthorityStore::delete_cert_authority`].
    pub async fn delete_cert_authority(
        &self,
        kind: CertAuthType,
        cluster_name: &str,
    ) -> AppResult<()> {
        self.authorities.delete_cert_authority(kind, cluster_name).await
    }

    /// See [`AuthorityStore::generate_cert_authority`].
    pub async fn generate_cert_authority(
        &self,
        kind: CertAuthType,
        cluster_name: &str,
    ) -> AppResult<CertAuthority> {
        self.authorities.generate_cert_authority(kind, cluster_name).await
    }

    /// See [`AuthorityStore::generate_host_cert`].
    pub async fn generate_host_cert(&self, req: &HostCertRequest) -> AppResult<HostCertificate> {
        self.authorities.generate_host_cert(req).await
    }

    /// See [`AuthorityStore::generate_user_cert`].
    pub async fn generate_user_cert(&self, req: &UserCertRequest) -> AppResult<UserCertificate> {
        self.authorities.generate_user_cert(req).await
    }

    /// See [`AuthorityStore::verify_host_cert`].
    pub async fn verify_host_cert(&self, cert: &HostCertificate) -> AppResult<()> {
        self.authorities.verify_host_cert(cert).await
    }

    /// See [`AuthorityStore::verify_user_cert`].
    pub async fn verify_user_cert(&self, cert: &UserCertificate) -> AppResult<()> {
        self.authorities.verify_user_cert(cert).await
    }

    // ── Provisioning tokens ────────────────────────────────

    /// See [`TokenRegistry::generate_token`].
    pub async fn generate_token(&self, roles: Roles, ttl: Duration) -> AppResult<String> {
        self.tokens.generate_token(roles, ttl).await
    }

    /// See [`TokenRegistry::upsert_token`].
    pub async fn upsert_token(&self, token: &str, roles: Roles, ttl: Duration) -> AppResult<()> {
        self.tokens.upsert_token(token, roles, ttl).await
    }

    /// See [`TokenRegistry::validate_token`].
    pub async fn validate_token(&self, token: &str) -> AppResult<Roles> {
        self.tokens.validate_token(token).await
    }

    /// See [`TokenRegistry::register_using_token`].
    pub async fn register_using_token(&self, req: &RegisterRequest) -> AppResult<PackedKeys> {
        self.tokens.register_using_token(req).await
    }

    /// See [`TokenRegistry::get_tokens`].
    pub async fn get_tokens(&self) -> AppResult<Vec<ProvisionToken>> {
        self.tokens.get_tokens().await
    }

    /// See [`TokenRegistry::delete_token`].
    pub async fn delete_token(&self, token: &str) -> AppResult<()> {
        self.tokens.delete_token(token).await
    }

    // ── Credentials and sessions ───────────────────────────

    /// See [`SessionManager::upsert_password`].
    pub async fn upsert_password(&self, user: &str, password: &str) -> AppResult<()> {
        self.sessions.upsert_password(user, password).await
    }

    /// See [`SessionManager::sign_in`].
    pub async fn sign_in(&self, user: &str, password: &str) -> AppResult<WebSession> {
        self.sessions.sign_in(user, password).await
    }

    /// See [`SessionManager::create_web_session`].
    pub async fn create_web_session(&self, user: &str) -> AppResult<WebSession> {
        self.sessions.create_web_session(user).await
    }

    /// See [`SessionManager::get_web_session`].
    pub async fn get_web_session(&self, user: &str, id: &str) -> AppResult<WebSession> {
        self.sessions.get_web_session(user, id).await
    }

    /// See [`SessionManager::get_web_session_info`].
    pub async fn get_web_session_info(&self, user: &str, id: &str) -> AppResult<WebSession> {
        self.sessions.get_web_session_info(user, id).await
    }

    /// See [`SessionManager::get_web_sessions`].
    pub async fn get_web_sessions(&self, user: &str) -> AppResult<Vec<WebSession>> {
        self.sessions.get_web_sessions(user).await
    }

    /// See [`SessionManager::delete_web_session`].
    pub async fn delete_web_session(&self, user: &str, id: &str) -> AppResult<()> {
        self.sessions.delete_web_session(user, id).await
    }

    /// See [`SessionManager::get_login_attempts`].
    pub async fn get_login_attempts(&self, user: &str) -> AppResult<LoginAttempts> {
        self.sessions.get_login_attempts(user).await
    }

    // ── Users and roles ────────────────────────────────────

    /// See [`UserStore::upsert_user`].
    pub async fn upsert_user(&self, user: &User) -> AppResult<()> {
        self.users.upsert_user(user).await
    }

    /// See [`UserStore::get_user`].
    pub async fn get_user(&self, name: &str) -> AppResult<User> {
        self.users.get_user(name).await
    }

    /// See [`UserStore::get_users`].
    pub async fn get_users(&self) -> AppResult<Vec<User>> {
        self.users.get_users().await
    }

    /// See [`UserStore::delete_user`].
    pub async fn delete_user(&self, name: &str) -> AppResult<()> {
        self.users.delete_user(name).await
    }

    /// See [`RoleStore::upsert_role`].
    pub async fn upsert_role(&self, role: &Role) -> AppResult<()> {
        self.roles.upsert_role(role).await
    }

    /// See [`RoleStore::get_role`].
    pub async fn get_role(&self, name: &str) -> AppResult<Role> {
        self.roles.get_role(name).await
    }

    /// See [`RoleStore::get_roles`].
    pub async fn get_roles(&self) -> AppResult<Vec<Role>> {
        self.roles.get_roles().await
    }

    /// See [`RoleStore::delete_role`].
    pub async fn delete_role(&self, name: &str) -> AppResult<()> {
        self.roles.delete_role(name).await
    }

    // ── OIDC ───────────────────────────────────────────────

    /// See [`ConnectorStore::upsert_oidc_connector`].
    pub async fn upsert_oidc_connector(&self, connector: &OidcConnector) -> AppResult<()> {
        self.connectors.upsert_oidc_connector(connector).await
    }

    /// See [`ConnectorStore::get_oidc_connector`].
    pub async fn get_oidc_connector(&self, name: &str) -> AppResult<OidcConnector> {
        self.connectors.get_oidc_connector(name).await
    }

    /// See [`ConnectorStore::get_oidc_connectors`].
    pub async fn get_oidc_connectors(&self, with_secrets: bool) -> AppResult<Vec<OidcConnector>> {
        self.connectors.get_oidc_connectors(with_secrets).await
    }

    /// See [`ConnectorStore::delete_oidc_connector`].
    pub async fn delete_oidc_connector(&self, name: &str) -> AppResult<()> {
        self.connectors.delete_oidc_connector(name).await
    }

    /// See [`IdentityMapper::build_roles`].
    pub async fn build_roles(
        &self,
        connector: &OidcConnector,
        claims: &Claims,
    ) -> AppResult<Vec<String>> {
        self.mapper.build_roles(connector, claims).await
    }

    /// See [`IdentityMapper::role_from_template`].
    pub fn role_from_template(&self, connector: &OidcConnector, claims: &Claims) -> AppResult<Role> {
        self.mapper.role_from_template(connector, claims)
    }

    /// Completes an OIDC login whose claims were already validated against
    /// the provider.
    ///
    /// The user is identified by the `email` claim, recorded with the
    /// mapped roles and given a new web session.
    pub async fn authenticate_oidc(
        &self,
        connector_name: &str,
        claims: &Claims,
    ) -> AppResult<OidcAuthResponse> {
        let email = claims.get_str("email").ok_or_else(|| {
            AppError::validation("OIDC claims carry no 'email' to identify the user")
        })?;
        let connector = self.connectors.get_oidc_connector(connector_name).await?;
        let roles = self.mapper.build_roles(&connector, claims).await?;
        if roles.is_empty() {
            return Err(AppError::no_matching_role(format!(
                "None of the claims matched a role mapping of connector '{connector_name}'"
            )));
        }

        let user = User {
            name: email.to_string(),
            roles: roles.clone(),
            created_by: Some(ConnectorIdentity {
                connector: connector.name.clone(),
                email: email.to_string(),
            }),
            created_at: self.clock.now(),
        };
        self.users.upsert_user(&user).await?;
        let session = self.sessions.create_web_session(&user.name).await?;

        info!(
            connector = %connector.name,
            user = %user.name,
            roles = ?roles,
            "OIDC login completed"
        );
        Ok(OidcAuthResponse {
            username: user.name,
            roles,
            session,
        })
    }
}
