//! Unified application error types for Bastion.
//!
//! Every component maps its failures into [`AppError`] so callers can match
//! on [`ErrorKind`] without caring which store or component produced it.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across the trust core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A token, session, role, authority or connector is absent.
    NotFound,
    /// A provisioning token is empty, garbled, tampered or unknown.
    InvalidToken,
    /// A provisioning token is past its expiry instant.
    TokenExpired,
    /// The provisioning token does not grant the requested role.
    RoleNotAllowed,
    /// The account is locked after too many failed attempts.
    AccountLocked,
    /// The supplied password does not match the stored credential.
    InvalidCredentials,
    /// The user has no stored credential or record.
    UserNotFound,
    /// A role template could not be rendered against the presented claims.
    TemplateRenderError,
    /// No claim mapping matched and the caller requires at least one role.
    NoMatchingRole,
    /// Certificate authority key material is missing or unusable.
    InvalidTrustMaterial,
    /// The backing store failed.
    Storage,
    /// Input validation failed.
    Validation,
    /// A conflicting record already exists.
    Conflict,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            Self::RoleNotAllowed => write!(f, "ROLE_NOT_ALLOWED"),
            Self::AccountLocked => write!(f, "ACCOUNT_LOCKED"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::UserNotFound => write!(f, "USER_NOT_FOUND"),
            Self::TemplateRenderError => write!(f, "TEMPLATE_RENDER_ERROR"),
            Self::NoMatchingRole => write!(f, "NO_MATCHING_ROLE"),
            Self::InvalidTrustMaterial => write!(f, "INVALID_TRUST_MATERIAL"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Bastion.
///
/// The `message` carries the context a caller needs to log or display the
/// failure (node name, host id, user name) without re-deriving it.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create a token-expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenExpired, message)
    }

    /// Create a role-not-allowed error.
    pub fn role_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RoleNotAllowed, message)
    }

    /// Create an account-locked error.
    pub fn account_locked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccountLocked, message)
    }

    /// Create an invalid-credentials error.
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCredentials, message)
    }

    /// Create a user-not-found error.
    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserNotFound, message)
    }

    /// Create a template rendering error.
    pub fn template_render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TemplateRenderError, message)
    }

    /// Create a no-matching-role error.
    pub fn no_matching_role(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoMatchingRole, message)
    }

    /// Create an invalid-trust-material error.
    pub fn invalid_trust_material(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTrustMaterial, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns `true` if the error reports an absent record.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Returns `true` if the error reports a locked account.
    pub fn is_account_locked(&self) -> bool {
        self.kind == ErrorKind::AccountLocked
    }

    /// Returns `true` if the error came from the backing store.
    pub fn is_storage(&self) -> bool {
        self.kind == ErrorKind::Storage
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
