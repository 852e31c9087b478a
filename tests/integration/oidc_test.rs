//! Integration tests for OIDC claim mapping and login completion.

mod helpers;

use std::collections::BTreeMap;
use std::time::Duration;

use bastion_auth::AuthServerConfig;
use bastion_auth::oidc::DEFAULT_TEMPLATED_ROLE_TTL;
use bastion_core::ErrorKind;
use bastion_core::config::{ClaimMappingConfig, OidcConnectorConfig};
use bastion_entity::authority::{SignedCertificate, UserCertificate};
use bastion_entity::oidc::{ClaimMapping, Claims, MappingAction, RoleTemplate};
use bastion_entity::role::{Role, RoleSpec};

use helpers::{TestApp, example_connector, static_mapping, user_claims};

fn template_mapping() -> ClaimMapping {
    ClaimMapping {
        claim: "roles".into(),
        value: "teleport-user".into(),
        action: MappingAction::Template(RoleTemplate {
            name: r#"{{index . "email"}}"#.into(),
            logins: vec![r#"{{index . "nickname"}}"#.into(), "root".into()],
            max_session_ttl: Some(Duration::from_secs(90 * 3600)),
            node_labels: BTreeMap::from([("*".to_string(), "*".to_string())]),
        }),
    }
}

#[tokio::test]
async fn test_build_roles_static() {
    let app = TestApp::new().await;
    let connector = example_connector(vec![static_mapping()]);

    let roles = app.server.build_roles(&connector, &user_claims()).await.unwrap();
    assert_eq!(roles, vec!["user"]);
    assert!(app.server.get_roles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_build_roles_template() {
    let app = TestApp::new().await;
    let connector = example_connector(vec![template_mapping()]);

    let roles = app.server.build_roles(&connector, &user_claims()).await.unwrap();
    assert_eq!(roles, vec!["foo@example.com"]);

    let stored = app.server.get_roles().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "foo@example.com");
}

#[tokio::test]
async fn test_role_from_template() {
    let app = TestApp::new().await;
    let connector = example_connector(vec![template_mapping()]);

    let role = app
        .server
        .role_from_template(&connector, &user_claims())
        .unwrap();
    let expected = Role::new(
        "foo@example.com",
        RoleSpec {
            logins: vec!["foo".into(), "root".into()],
            max_session_ttl: Duration::from_secs(30 * 3600),
            ..RoleSpec::default()
        },
    )
    .unwrap();
    assert_eq!(role, expected);
    assert_eq!(role.spec.max_session_ttl, DEFAULT_TEMPLATED_ROLE_TTL);
}

#[tokio::test]
async fn test_unmatched_claims_map_to_nothing() {
    let app = TestApp::new().await;
    let connector = example_connector(vec![static_mapping(), template_mapping()]);
    let claims = Claims::new().with("roles", "someone-else");

    let roles = app.server.build_roles(&connector, &claims).await.unwrap();
    assert!(roles.is_empty());
}

#[tokio::test]
async fn test_template_with_missing_claim() {
    let app = TestApp::new().await;
    let connector = example_connector(vec![template_mapping()]);
    let claims = Claims::new().with("roles", "teleport-user").with("email", "foo@example.com");

    let err = app.server.build_roles(&connector, &claims).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TemplateRenderError);
    assert!(err.message.contains("nickname"));
}

#[tokio::test]
async fn test_authenticate_oidc() {
    let app = TestApp::new().await;
    app.server
        .upsert_oidc_connector(&example_connector(vec![template_mapping(), static_mapping()]))
        .await
        .unwrap();

    let response = app
        .server
        .authenticate_oidc("example", &user_claims())
        .await
        .unwrap();
    assert_eq!(response.username, "foo@example.com");
    assert_eq!(response.roles, vec!["foo@example.com", "user"]);

    let user = app.server.get_user("foo@example.com").await.unwrap();
    assert_eq!(user.roles, response.roles);
    let identity = user.created_by.unwrap();
    assert_eq!(identity.connector, "example");
    assert_eq!(identity.email, "foo@example.com");

    let cert = UserCertificate::decode(&response.session.certificate).unwrap();
    assert_eq!(cert.principals, vec!["foo@example.com", "foo", "root"]);
    app.server
        .get_web_session("foo@example.com", &response.session.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_authenticate_oidc_requires_a_match() {
    let app = TestApp::new().await;
    app.server
        .upsert_oidc_connector(&example_connector(vec![static_mapping()]))
        .await
        .unwrap();

    let err = app
        .server
        .authenticate_oidc("example", &Claims::new().with("email", "x@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoMatchingRole);

    let err = app
        .server
        .authenticate_oidc("missing", &user_claims())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_authenticate_oidc_without_email_stores_nothing() {
    let app = TestApp::new().await;
    app.server
        .upsert_oidc_connector(&example_connector(vec![template_mapping()]))
        .await
        .unwrap();
    let claims = Claims::new()
        .with("roles", "teleport-user")
        .with("nickname", "foo");

    let err = app
        .server
        .authenticate_oidc("example", &claims)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(app.server.get_roles().await.unwrap().is_empty());
    assert!(app.server.get_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bootstrap_stores_configured_connectors() {
    let mut config = AuthServerConfig::new(helpers::CLUSTER);
    config.oidc_connectors = vec![OidcConnectorConfig {
        name: "google".into(),
        issuer_url: "https://accounts.google.com".into(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        redirect_url: "https://localhost:3080/v1/webapi/oidc/callback".into(),
        display: "Google".into(),
        scope: vec!["email".into()],
        claims_to_roles: vec![ClaimMappingConfig {
            claim: "groups".into(),
            value: "admins".into(),
            roles: vec!["admin".into()],
            role_template: None,
        }],
    }];
    let app = TestApp::with_config(config).await;

    let connector = app.server.get_oidc_connector("google").await.unwrap();
    assert_eq!(
        connector.claims_to_roles[0].action,
        MappingAction::Roles(vec!["admin".into()])
    );
    let listed = app.server.get_oidc_connectors(false).await.unwrap();
    assert!(listed[0].client_secret.is_empty());
}
