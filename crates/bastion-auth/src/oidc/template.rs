//! Claim templates such as `{{index . "email"}}` or `{{nickname}}`.
//!
//! A template is literal text with placeholders. Each placeholder names one
//! claim, which must be present and hold a string.

use std::sync::LazyLock;

use regex::Regex;

use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_entity::oidc::Claims;

const PLACEHOLDER: &str =
    r#"^\s*(?:index\s+\.\s+"(?P<indexed>[^"]+)"|\.?(?P<bare>[A-Za-z_][A-Za-z0-9_.\-]*))\s*$"#;

static PLACEHOLDER_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(PLACEHOLDER));

/// Renders `template` against `claims`.
pub fn render(template: &str, claims: &Claims) -> AppResult<String> {
    let placeholder = PLACEHOLDER_RE
        .as_ref()
        .map_err(|e| AppError::internal(format!("Invalid placeholder pattern: {e}")))?;

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let literal = &rest[..start];
        if literal.contains("}}") {
            return Err(unbalanced(template));
        }
        out.push_str(literal);

        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| unbalanced(template))?;
        let inner = &after[..end];
        if inner.contains("{{") {
            return Err(unbalanced(template));
        }

        let captures = placeholder.captures(inner).ok_or_else(|| {
            AppError::template_render(format!(
                "Unsupported placeholder '{{{{{inner}}}}}' in template '{template}'"
            ))
        })?;
        let claim = captures
            .name("indexed")
            .or_else(|| captures.name("bare"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        out.push_str(lookup(claims, claim)?);

        rest = &after[end + 2..];
    }
    if rest.contains("}}") {
        return Err(unbalanced(template));
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup<'a>(claims: &'a Claims, claim: &str) -> AppResult<&'a str> {
    match claims.get(claim) {
        None => Err(AppError::template_render(format!(
            "Claim '{claim}' is not present"
        ))),
        Some(value) => value.as_str().ok_or_else(|| {
            AppError::template_render(format!("Claim '{claim}' is not a string"))
        }),
    }
}

fn unbalanced(template: &str) -> AppError {
    AppError::template_render(format!("Unbalanced braces in template '{template}'"))
}
