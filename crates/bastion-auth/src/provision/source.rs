//! Where provisioning tokens come from.
//!
//! Tokens are either fixed in configuration ([`StaticTokens`]) or generated
//! at runtime and persisted ([`DynamicTokens`]). The registry consults both
//! through [`TokenSource`], static first.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use bastion_backend::keys;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, BackendExt};
use bastion_core::types::Ttl;
use bastion_entity::token::{ProvisionToken, parse_static_token};

/// Origin of a provisioning token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    /// Defined in configuration.
    Static,
    /// Generated and stored in the backend.
    Dynamic,
}

impl fmt::Display for TokenOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// A set of provisioning tokens the registry can look up and list.
#[async_trait]
pub trait TokenSource: Send + Sync + fmt::Debug {
    /// Which kind of source this is.
    fn origin(&self) -> TokenOrigin;

    /// Find a token by value, expired or not.
    async fn lookup(&self, token: &str) -> AppResult<Option<ProvisionToken>>;

    /// Every token in the source, expired or not.
    async fn list(&self) -> AppResult<Vec<ProvisionToken>>;
}

/// Tokens fixed in configuration. They never expire and can not be deleted.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: Vec<ProvisionToken>,
}

impl StaticTokens {
    /// Parses `"role1,role2:secret"` definitions.
    ///
    /// Two definitions sharing a secret are a configuration error.
    pub fn from_config(definitions: &[String]) -> AppResult<Self> {
        let mut seen = HashSet::new();
        let mut tokens = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let token = parse_static_token(definition)?;
            if !seen.insert(token.token.clone()) {
                return Err(AppError::configuration(
                    "Static token secret is defined more than once",
                ));
            }
            tokens.push(token);
        }
        Ok(Self { tokens })
    }

    /// Whether `token` is a static token.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t.token == token)
    }

    /// Number of static tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no static tokens are configured.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenSource for StaticTokens {
    fn origin(&self) -> TokenOrigin {
        TokenOrigin::Static
    }

    async fn lookup(&self, token: &str) -> AppResult<Option<ProvisionToken>> {
        Ok(self.tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn list(&self) -> AppResult<Vec<ProvisionToken>> {
        Ok(self.tokens.clone())
    }
}

/// Tokens generated at runtime and persisted in the backend.
#[derive(Debug, Clone)]
pub struct DynamicTokens {
    backend: Arc<dyn Backend>,
}

impl DynamicTokens {
    /// Creates a source over `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Stores a token only if the value is unused. Returns `false` on collision.
    pub async fn create(&self, token: &ProvisionToken, ttl: Ttl) -> AppResult<bool> {
        let json = serde_json::to_string(token)?;
        self.backend.create(&keys::token(&token.token), &json, ttl).await
    }

    /// Stores a token, replacing any previous record with the same value.
    pub async fn put(&self, token: &ProvisionToken, ttl: Ttl) -> AppResult<()> {
        self.backend
            .put_json(&keys::token(&token.token), token, ttl)
            .await
    }

    /// Atomically removes a token and returns it. Only one caller can win.
    pub async fn take(&self, token: &str) -> AppResult<Option<ProvisionToken>> {
        match self.backend.take(&keys::token(token)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Removes a token. Returns `false` if it did not exist.
    pub async fn delete(&self, token: &str) -> AppResult<bool> {
        self.backend.delete(&keys::token(token)).await
    }
}

#[async_trait]
impl TokenSource for DynamicTokens {
    fn origin(&self) -> TokenOrigin {
        TokenOrigin::Dynamic
    }

    async fn lookup(&self, token: &str) -> AppResult<Option<ProvisionToken>> {
        self.backend.get_json(&keys::token(token)).await
    }

    async fn list(&self) -> AppResult<Vec<ProvisionToken>> {
        self.backend.list_json(&keys::tokens()).await
    }
}
