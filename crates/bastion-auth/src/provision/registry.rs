//! Provisioning token registry: issues bootstrap tokens and registers new
//! cluster members with them.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::{error, info, warn};

use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, Clock};
use bastion_core::types::{Roles, SystemRole, Ttl};
use bastion_entity::authority::{PackedKeys, SignedCertificate};
use bastion_entity::token::{ProvisionToken, is_token_char};

use crate::authority::keys::generate_key_pair;
use crate::authority::{AuthorityStore, HostCertRequest};

use super::source::{DynamicTokens, StaticTokens, TokenOrigin, TokenSource};

/// Random bytes in a generated token. Tokens are hex encoded, so twice as
/// many characters.
pub const TOKEN_LEN_BYTES: usize = 16;

pub use bastion_entity::token::MAX_TOKEN_LEN;

/// How long an expired dynamic token record is kept so that a late caller
/// is told it expired rather than that it never existed.
const REAP_GRACE: Duration = Duration::from_secs(60 * 60);

/// A node asking to join the cluster.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    /// Provisioning token presented by the node.
    pub token: String,
    /// Stable host identifier.
    pub host_id: String,
    /// Human-readable node name.
    pub node_name: String,
    /// Role the node wants to join with.
    pub role: SystemRole,
}

/// Issues, validates and consumes provisioning tokens.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    static_tokens: StaticTokens,
    dynamic_tokens: DynamicTokens,
    authorities: AuthorityStore,
    clock: Arc<dyn Clock>,
    single_use_ttl: Duration,
}

impl TokenRegistry {
    /// Creates a registry. `single_use_ttl` bounds how long an unused
    /// single-use token stays valid.
    pub fn new(
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        authorities: AuthorityStore,
        static_tokens: StaticTokens,
        single_use_ttl: Duration,
    ) -> Self {
        Self {
            static_tokens,
            dynamic_tokens: DynamicTokens::new(backend),
            authorities,
            clock,
            single_use_ttl,
        }
    }

    /// Generates a random token granting `roles`.
    ///
    /// A zero `ttl` yields a single-use token; otherwise the token may be
    /// used any number of times until it expires.
    pub async fn generate_token(&self, roles: Roles, ttl: Duration) -> AppResult<String> {
        if roles.is_empty() {
            return Err(AppError::validation(
                "A provisioning token must grant at least one role",
            ));
        }

        let token = self.new_token(hex::encode(rand::random::<[u8; TOKEN_LEN_BYTES]>()), roles, ttl)?;
        if !self
            .dynamic_tokens
            .create(&token, self.record_ttl(ttl))
            .await?
        {
            return Err(AppError::conflict("Generated token collides with an existing one"));
        }

        info!(
            roles = %token.roles,
            single_use = token.single_use,
            "Provisioning token generated"
        );
        Ok(token.token)
    }

    /// Stores a token with an operator-chosen value.
    pub async fn upsert_token(&self, value: &str, roles: Roles, ttl: Duration) -> AppResult<()> {
        check_format(value).map_err(|e| AppError::validation(e.message))?;
        if roles.is_empty() {
            return Err(AppError::validation(
                "A provisioning token must grant at least one role",
            ));
        }
        if self.static_tokens.contains(value) {
            return Err(AppError::conflict(
                "Token value is already defined as a static token",
            ));
        }

        let token = self.new_token(value.to_string(), roles, ttl)?;
        self.dynamic_tokens.put(&token, self.record_ttl(ttl)).await?;
        info!(roles = %token.roles, single_use = token.single_use, "Provisioning token stored");
        Ok(())
    }

    /// Returns the roles a token grants without consuming it.
    pub async fn validate_token(&self, token: &str) -> AppResult<Roles> {
        check_format(token)?;
        let (record, origin) = self
            .resolve(token)
            .await?
            .ok_or_else(|| AppError::invalid_token("Token is not valid"))?;

        if origin == TokenOrigin::Dynamic && record.is_expired(self.clock.now()) {
            self.reap(token).await?;
            return Err(AppError::token_expired("Token has expired"));
        }
        Ok(record.roles)
    }

    /// Registers a node, returning its freshly generated key and host
    /// certificate.
    ///
    /// Single-use tokens are consumed atomically, so of several concurrent
    /// registrations only one succeeds.
    pub async fn register_using_token(&self, req: &RegisterRequest) -> AppResult<PackedKeys> {
        check_format(&req.token)?;
        let node = &req.node_name;
        let host = &req.host_id;

        let (record, origin) = self.resolve(&req.token).await?.ok_or_else(|| {
            AppError::not_found(format!(
                "\"{node}\" [{host}] can not join the cluster, token not found"
            ))
        })?;

        if origin == TokenOrigin::Dynamic && record.is_expired(self.clock.now()) {
            self.reap(&req.token).await?;
            warn!(node = %node, host_id = %host, "Registration with expired token");
            return Err(AppError::token_expired(format!(
                "\"{node}\" [{host}] can not join the cluster. Token has expired"
            )));
        }

        if !record.roles.include(req.role) {
            warn!(node = %node, host_id = %host, role = %req.role, "Registration with disallowed role");
            return Err(AppError::role_not_allowed(format!(
                "\"{node}\" [{host}] can not join the cluster, the token does not allow \"{}\" role",
                req.role
            )));
        }

        let consumed = if origin == TokenOrigin::Dynamic && record.single_use {
            let taken = self.dynamic_tokens.take(&req.token).await?.ok_or_else(|| {
                AppError::not_found(format!(
                    "\"{node}\" [{host}] can not join the cluster, token was already used"
                ))
            })?;
            Some(taken)
        } else {
            None
        };

        match self.issue_keys(req).await {
            Ok(keys) => {
                info!(node = %node, host_id = %host, role = %req.role, "Node joined the cluster");
                Ok(keys)
            }
            Err(e) => {
                if let Some(token) = consumed {
                    error!(
                        node = %node,
                        host_id = %host,
                        error = %e,
                        "Issuing host credentials failed, restoring single-use token"
                    );
                    let ttl = token
                        .expires
                        .map(|expires| {
                            let reap_at = expires.checked_add_signed(grace_delta()).unwrap_or(expires);
                            Ttl::until(reap_at, self.clock.now())
                        })
                        .unwrap_or(Ttl::Forever);
                    match self.dynamic_tokens.create(&token, ttl).await {
                        Ok(true) => {}
                        Ok(false) => warn!(
                            node = %node,
                            host_id = %host,
                            "Single-use token was not restored, its value is taken again"
                        ),
                        Err(restore) => error!(
                            node = %node,
                            host_id = %host,
                            error = %restore,
                            "Restoring single-use token failed"
                        ),
                    }
                }
                Err(e)
            }
        }
    }

    /// Lists static tokens followed by unexpired dynamic tokens.
    ///
    /// Expired dynamic tokens are removed while listing.
    pub async fn get_tokens(&self) -> AppResult<Vec<ProvisionToken>> {
        let now = self.clock.now();
        let mut tokens = self.static_tokens.list().await?;
        for token in self.dynamic_tokens.list().await? {
            if self.static_tokens.contains(&token.token) {
                warn!("Dynamic token shadowed by a static token with the same value");
                continue;
            }
            if token.is_expired(now) {
                self.reap(&token.token).await?;
                continue;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Deletes a dynamic token.
    pub async fn delete_token(&self, token: &str) -> AppResult<()> {
        if self.static_tokens.contains(token) {
            return Err(AppError::validation("Static tokens can not be deleted"));
        }
        if !self.dynamic_tokens.delete(token).await? {
            return Err(AppError::not_found("Token not found"));
        }
        info!("Provisioning token deleted");
        Ok(())
    }

    async fn resolve(&self, token: &str) -> AppResult<Option<(ProvisionToken, TokenOrigin)>> {
        let sources: [&dyn TokenSource; 2] = [&self.static_tokens, &self.dynamic_tokens];
        for source in sources {
            if let Some(record) = source.lookup(token).await? {
                return Ok(Some((record, source.origin())));
            }
        }
        Ok(None)
    }

    async fn reap(&self, token: &str) -> AppResult<()> {
        if self.dynamic_tokens.delete(token).await? {
            info!("Expired provisioning token removed");
        }
        Ok(())
    }

    async fn issue_keys(&self, req: &RegisterRequest) -> AppResult<PackedKeys> {
        let pair = generate_key_pair();
        let cert = self
            .authorities
            .generate_host_cert(&HostCertRequest {
                host_id: req.host_id.clone(),
                node_name: req.node_name.clone(),
                role: req.role,
                public_key: pair.public_key,
            })
            .await?;
        Ok(PackedKeys {
            key: pair.private_key,
            cert: cert.encode()?,
        })
    }

    fn new_token(&self, value: String, roles: Roles, ttl: Duration) -> AppResult<ProvisionToken> {
        let single_use = ttl.is_zero();
        let lifetime = if single_use { self.single_use_ttl } else { ttl };
        let expires = TimeDelta::from_std(lifetime)
            .ok()
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| AppError::validation(format!("Token TTL {lifetime:?} is out of range")))?;
        Ok(ProvisionToken {
            token: value,
            roles,
            expires: Some(expires),
            single_use,
        })
    }

    fn record_ttl(&self, ttl: Duration) -> Ttl {
        let lifetime = if ttl.is_zero() { self.single_use_ttl } else { ttl };
        Ttl::For(lifetime.saturating_add(REAP_GRACE))
    }
}

fn grace_delta() -> TimeDelta {
    TimeDelta::from_std(REAP_GRACE).unwrap_or(TimeDelta::zero())
}

/// Rejects values that can not be a token before any lookup happens.
fn check_format(token: &str) -> AppResult<()> {
    if token.is_empty() {
        return Err(AppError::invalid_token("Token is empty"));
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(AppError::invalid_token("Token is too long"));
    }
    if !token.chars().all(is_token_char) {
        return Err(AppError::invalid_token("Token contains invalid characters"));
    }
    Ok(())
}
