//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate. Each
//! sub-module represents a logical configuration section.

pub mod auth;
pub mod backend;
pub mod cluster;
pub mod logging;
pub mod oidc;
pub mod tokens;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::backend::BackendConfig;
pub use self::cluster::ClusterConfig;
pub use self::logging::LoggingConfig;
pub use self::oidc::{ClaimMappingConfig, OidcConfig, OidcConnectorConfig, RoleTemplateConfig};
pub use self::tokens::TokenConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// configuration files (default + environment overlay + `BASTION__*` vars).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity of the local cluster.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Credential, lockout and session settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Provisioning token settings.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Federated identity connectors.
    #[serde(default)]
    pub oidc: OidcConfig,
    /// Backing store settings.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default` with an environment-specific overlay and
    /// environment variables prefixed with `BASTION__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BASTION")
                    .separator("__")
                    .list_separator(";")
                    .with_list_parse_key("tokens.static_tokens")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
