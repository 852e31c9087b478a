//! Parsing of statically configured tokens (`"proxy,node:secret"`).

use bastion_core::error::AppError;
use bastion_core::types::Roles;

use super::model::{MAX_TOKEN_LEN, ProvisionToken, is_token_char};

/// Parse a `"role1,role2:secret"` definition into a never-expiring token.
pub fn parse_static_token(definition: &str) -> Result<ProvisionToken, AppError> {
    let (roles, secret) = definition.split_once(':').ok_or_else(|| {
        AppError::configuration(format!(
            "Invalid static token '{definition}': expected 'roles:secret'"
        ))
    })?;

    let secret = secret.trim();
    if secret.is_empty() {
        return Err(AppError::configuration(
            "Invalid static token: secret is empty",
        ));
    }
    if secret.len() > MAX_TOKEN_LEN {
        return Err(AppError::configuration(format!(
            "Invalid static token: secret is longer than {MAX_TOKEN_LEN} characters"
        )));
    }
    if !secret.chars().all(is_token_char) {
        return Err(AppError::configuration(
            "Invalid static token: secret contains whitespace, control characters or '/'",
        ));
    }

    let roles: Roles = roles.parse().map_err(|e: AppError| {
        AppError::configuration(format!("Invalid static token roles: {}", e.message))
    })?;
    if roles.is_empty() {
        return Err(AppError::configuration(
            "Invalid static token: at least one role is required",
        ));
    }

    Ok(ProvisionToken {
        token: secret.to_string(),
        roles,
        expires: None,
        single_use: false,
    })
}
