//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use bastion_auth::provision::RegisterRequest;
use bastion_auth::{AuthServer, AuthServerConfig};
use bastion_backend::memory::MemoryBackend;
use bastion_core::traits::{Backend, FakeClock};
use bastion_core::types::SystemRole;
use bastion_entity::authority::CertAuthType;
use bastion_entity::oidc::{ClaimMapping, Claims, MappingAction, OidcConnector};

/// Name of the cluster every test app belongs to.
pub const CLUSTER: &str = "me.localhost";

/// Test application context
pub struct TestApp {
    /// The auth server under test
    pub server: AuthServer,
    /// Clock driving every expiry decision
    pub clock: FakeClock,
    /// Backend shared with the server, for direct record access
    pub backend: Arc<dyn Backend>,
}

impl TestApp {
    /// Create a test application with default settings and both local
    /// authorities in place.
    pub async fn new() -> Self {
        Self::with_config(AuthServerConfig::new(CLUSTER)).await
    }

    /// Create a test application that also accepts the given static tokens.
    pub async fn with_static_tokens(tokens: &[&str]) -> Self {
        let mut config = AuthServerConfig::new(CLUSTER);
        config.tokens.static_tokens = tokens.iter().map(|t| t.to_string()).collect();
        Self::with_config(config).await
    }

    /// Create a test application from explicit settings.
    pub async fn with_config(config: AuthServerConfig) -> Self {
        let clock = FakeClock::new();
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new(Arc::new(clock.clone())));
        let server = AuthServer::new(config, backend.clone(), Arc::new(clock.clone()))
            .expect("Failed to build auth server");
        server.bootstrap().await.expect("Failed to bootstrap");
        assert!(
            server
                .get_cert_authority(CertAuthType::Host, CLUSTER, false)
                .await
                .is_ok()
        );

        Self {
            server,
            clock,
            backend,
        }
    }

    /// Create a user with a password.
    pub async fn create_test_user(&self, name: &str, password: &str) {
        self.server
            .upsert_password(name, password)
            .await
            .expect("Failed to set password");
    }
}

/// Registration request for a node.
pub fn join_request(token: &str, host_id: &str, node_name: &str, role: SystemRole) -> RegisterRequest {
    RegisterRequest {
        token: token.to_string(),
        host_id: host_id.to_string(),
        node_name: node_name.to_string(),
        role,
    }
}

/// A connector with the given mappings.
pub fn example_connector(claims_to_roles: Vec<ClaimMapping>) -> OidcConnector {
    OidcConnector {
        name: "example".into(),
        issuer_url: "https://www.example.com".into(),
        client_id: "example-client-id".into(),
        client_secret: "example-client-secret".into(),
        redirect_url: "https://localhost:3080/v1/webapi/oidc/callback".into(),
        display: "sign in with example.com".into(),
        scope: vec!["foo".into(), "bar".into()],
        claims_to_roles,
    }
}

/// Static mapping of `roles=teleport-user` to `user`.
pub fn static_mapping() -> ClaimMapping {
    ClaimMapping {
        claim: "roles".into(),
        value: "teleport-user".into(),
        action: MappingAction::Roles(vec!["user".into()]),
    }
}

/// Claims of a typical provider user.
pub fn user_claims() -> Claims {
    Claims::new()
        .with("roles", "teleport-user")
        .with("email", "foo@example.com")
        .with("nickname", "foo")
        .with("full_name", "foo bar")
}
