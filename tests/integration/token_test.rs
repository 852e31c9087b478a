//! Integration tests for provisioning tokens and node registration.

mod helpers;

use std::collections::HashSet;
use std::time::Duration;

use bastion_auth::provision::TOKEN_LEN_BYTES;
use bastion_core::ErrorKind;
use bastion_core::types::{Roles, SystemRole};
use bastion_entity::authority::{HostCertificate, SignedCertificate};

use helpers::{TestApp, join_request};

#[tokio::test]
async fn test_tokens_crud() {
    let app = TestApp::new().await;

    // single-use token
    let tok = app
        .server
        .generate_token(Roles::new([SystemRole::Node]), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(tok.len(), 2 * TOKEN_LEN_BYTES);

    let tokens = app.server.get_tokens().await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token, tok);

    let roles = app.server.validate_token(&tok).await.unwrap();
    assert!(roles.include(SystemRole::Node));
    assert!(!roles.include(SystemRole::Proxy));

    let err = app
        .server
        .register_using_token(&join_request(&tok, "bad-host-id", "bad-node-name", SystemRole::Proxy))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RoleNotAllowed);
    assert_eq!(
        err.message,
        r#""bad-node-name" [bad-host-id] can not join the cluster, the token does not allow "Proxy" role"#
    );
    app.server.validate_token(&tok).await.unwrap();

    // multi-use token with a long TTL
    let multi_use = app
        .server
        .generate_token(Roles::new([SystemRole::Proxy]), Duration::from_secs(3600))
        .await
        .unwrap();
    app.server.validate_token(&multi_use).await.unwrap();

    for host in ["once", "twice"] {
        app.server
            .register_using_token(&join_request(&multi_use, host, "node-name", SystemRole::Proxy))
            .await
            .unwrap();
    }

    // past its TTL
    app.clock.advance(Duration::from_secs(3600) + Duration::from_nanos(1));
    let err = app
        .server
        .register_using_token(&join_request(&multi_use, "late.bird", "node-name", SystemRole::Proxy))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenExpired);
    assert_eq!(
        err.message,
        r#""node-name" [late.bird] can not join the cluster. Token has expired"#
    );

    // the expired token is gone
    let err = app.server.delete_token(&multi_use).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_static_tokens() {
    let app = TestApp::with_static_tokens(&["proxy:static-token-value"]).await;

    app.server
        .register_using_token(&join_request(
            "static-token-value",
            "static.host",
            "node-name",
            SystemRole::Proxy,
        ))
        .await
        .unwrap();
    let err = app
        .server
        .register_using_token(&join_request(
            "static-token-value",
            "wrong.role",
            "node-name",
            SystemRole::Auth,
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RoleNotAllowed);

    let roles = app.server.validate_token("static-token-value").await.unwrap();
    assert_eq!(roles, Roles::new([SystemRole::Proxy]));

    // static tokens never expire
    app.clock.advance(Duration::from_secs(365 * 24 * 3600));
    app.server.validate_token("static-token-value").await.unwrap();

    // listing shows the static token and a regular one
    app.server
        .generate_token(Roles::new([SystemRole::Node]), Duration::from_secs(60))
        .await
        .unwrap();
    let tokens = app.server.get_tokens().await.unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].token, "static-token-value");
}

#[tokio::test]
async fn test_static_collision_rejected() {
    let app = TestApp::with_static_tokens(&["node:shared-value"]).await;
    let err = app
        .server
        .upsert_token("shared-value", Roles::new([SystemRole::Auth]), Duration::from_secs(60))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let roles = app.server.validate_token("shared-value").await.unwrap();
    assert_eq!(roles, Roles::new([SystemRole::Node]));
}

#[tokio::test]
async fn test_bad_tokens() {
    let app = TestApp::new().await;

    for bad in ["", "bla bla"] {
        let err = app.server.validate_token(bad).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    let tok = app
        .server
        .generate_token(Roles::new([SystemRole::Auth]), Duration::ZERO)
        .await
        .unwrap();
    let first = if tok.starts_with('0') { '1' } else { '0' };
    let tampered = format!("{first}{}", &tok[1..]);
    let err = app.server.validate_token(&tampered).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    let err = app
        .server
        .register_using_token(&join_request(&tampered, "host", "node", SystemRole::Auth))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.message.contains("\"node\" [host]"));
}

#[tokio::test]
async fn test_generated_tokens_are_unique() {
    let app = TestApp::new().await;
    let mut seen = HashSet::new();
    for _ in 0..50 {
        let tok = app
            .server
            .generate_token(Roles::new([SystemRole::Node]), Duration::ZERO)
            .await
            .unwrap();
        assert!(seen.insert(tok));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_use_token_races() {
    let app = TestApp::new().await;
    let tok = app
        .server
        .generate_token(Roles::new([SystemRole::Node]), Duration::ZERO)
        .await
        .unwrap();

    let attempts = (0..8).map(|i| {
        let server = app.server.clone();
        let tok = tok.clone();
        tokio::spawn(async move {
            server
                .register_using_token(&join_request(&tok, &format!("host-{i}"), "node", SystemRole::Node))
                .await
        })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(err.is_not_found(), "{err}");
    }
    assert!(app.server.get_tokens().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_registered_host_cert_verifies() {
    let app = TestApp::new().await;
    let tok = app
        .server
        .generate_token(Roles::new([SystemRole::Node]), Duration::ZERO)
        .await
        .unwrap();
    let keys = app
        .server
        .register_using_token(&join_request(&tok, "host-1", "node-1", SystemRole::Node))
        .await
        .unwrap();
    assert!(!keys.key.is_empty());

    let cert = HostCertificate::decode(&keys.cert).unwrap();
    assert_eq!(cert.cluster_name, helpers::CLUSTER);
    assert_eq!(cert.node_name, "node-1");
    app.server.verify_host_cert(&cert).await.unwrap();

    let mut tampered = cert.clone();
    tampered.host_id = "host-2".into();
    let err = app.server.verify_host_cert(&tampered).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTrustMaterial);
}

#[tokio::test]
async fn test_token_ttl_beyond_time_range() {
    let app = TestApp::new().await;
    let err = app
        .server
        .generate_token(
            Roles::new([SystemRole::Node]),
            Duration::from_secs(400_000 * 365 * 86_400),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(app.server.get_tokens().await.unwrap().is_empty());
}
