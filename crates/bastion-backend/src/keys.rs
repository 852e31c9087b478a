//! Backend key builders for every Bastion record.
//!
//! Centralising key construction keeps the layout in one place. Names
//! embedded in keys are validated by the owning store to contain no `/`.

/// Prefix applied to all Bastion keys.
const PREFIX: &str = "bastion";

// ── Certificate authorities ────────────────────────────────

/// Key of one authority.
pub fn authority(kind: &str, cluster_name: &str) -> String {
    format!("{PREFIX}/authorities/{kind}/{cluster_name}")
}

/// Prefix of all authorities of a kind.
pub fn authorities(kind: &str) -> String {
    format!("{PREFIX}/authorities/{kind}/")
}

// ── Provisioning tokens ────────────────────────────────────

/// Key of a dynamic provisioning token.
pub fn token(token: &str) -> String {
    format!("{PREFIX}/tokens/{token}")
}

/// Prefix of all dynamic provisioning tokens.
pub fn tokens() -> String {
    format!("{PREFIX}/tokens/")
}

// ── Users and credentials ──────────────────────────────────

/// Key of a user record.
pub fn user(name: &str) -> String {
    format!("{PREFIX}/users/{name}")
}

/// Prefix of all user records.
pub fn users() -> String {
    format!("{PREFIX}/users/")
}

/// Key of a user's password hash.
pub fn password(user: &str) -> String {
    format!("{PREFIX}/passwords/{user}")
}

/// Key of a user's failed sign-in state.
pub fn login_attempts(user: &str) -> String {
    format!("{PREFIX}/attempts/{user}")
}

// ── Web sessions ───────────────────────────────────────────

/// Key of one web session.
pub fn web_session(user: &str, session_id: &str) -> String {
    format!("{PREFIX}/sessions/{user}/{session_id}")
}

/// Prefix of all sessions of a user.
pub fn web_sessions(user: &str) -> String {
    format!("{PREFIX}/sessions/{user}/")
}

// ── Roles and connectors ───────────────────────────────────

/// Key of a role.
pub fn role(name: &str) -> String {
    format!("{PREFIX}/roles/{name}")
}

/// Prefix of all roles.
pub fn roles() -> String {
    format!("{PREFIX}/roles/")
}

/// Key of an OIDC connector.
pub fn oidc_connector(name: &str) -> String {
    format!("{PREFIX}/connectors/oidc/{name}")
}

/// Prefix of all OIDC connectors.
pub fn oidc_connectors() -> String {
    format!("{PREFIX}/connectors/oidc/")
}
