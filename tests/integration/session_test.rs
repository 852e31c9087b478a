//! Integration tests for sign-in, lockout and web sessions.

mod helpers;

use std::time::Duration;

use bastion_core::ErrorKind;
use bastion_core::traits::Clock;
use bastion_entity::authority::{SignedCertificate, UserCertificate};
use bastion_entity::role::{Role, RoleSpec};
use bastion_entity::user::User;

use helpers::TestApp;

const MAX_LOGIN_ATTEMPTS: u32 = 5;
const ACCOUNT_LOCK_INTERVAL: Duration = Duration::from_secs(20 * 60);

#[tokio::test]
async fn test_user_lock() {
    let app = TestApp::new().await;
    app.create_test_user("user1", "abc123").await;

    let session = app.server.sign_in("user1", "abc123").await.unwrap();
    assert_eq!(session.user, "user1");

    for _ in 0..=MAX_LOGIN_ATTEMPTS {
        assert!(app.server.sign_in("user1", "wrong pass").await.is_err());
    }

    let err = app.server.sign_in("user1", "abc123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountLocked);
    assert!(err.message.contains("locked"));

    app.clock.advance(ACCOUNT_LOCK_INTERVAL + Duration::from_secs(1));
    app.server.sign_in("user1", "abc123").await.unwrap();
}

#[tokio::test]
async fn test_locked_account_ignores_attempts() {
    let app = TestApp::new().await;
    app.create_test_user("user1", "abc123").await;

    for _ in 0..=MAX_LOGIN_ATTEMPTS {
        let _ = app.server.sign_in("user1", "wrong pass").await;
    }
    let locked = app.server.get_login_attempts("user1").await.unwrap();
    assert_eq!(locked.failures, MAX_LOGIN_ATTEMPTS + 1);

    let err = app.server.sign_in("user1", "wrong pass").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountLocked);
    assert_eq!(app.server.get_login_attempts("user1").await.unwrap(), locked);
}

#[tokio::test]
async fn test_failures_below_limit_do_not_lock() {
    let app = TestApp::new().await;
    app.create_test_user("user1", "abc123").await;

    for _ in 0..MAX_LOGIN_ATTEMPTS {
        let err = app.server.sign_in("user1", "wrong pass").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    }
    app.server.sign_in("user1", "abc123").await.unwrap();
    assert_eq!(app.server.get_login_attempts("user1").await.unwrap().failures, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_failures_still_lock() {
    let app = TestApp::new().await;
    app.create_test_user("user1", "abc123").await;

    let attempts = (0..64).map(|_| {
        let server = app.server.clone();
        tokio::spawn(async move { server.sign_in("user1", "wrong pass").await })
    });
    let errors: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap_err())
        .collect();

    let checked = errors
        .iter()
        .filter(|e| e.kind == ErrorKind::InvalidCredentials)
        .count();
    let locked = errors
        .iter()
        .filter(|e| e.kind == ErrorKind::AccountLocked)
        .count();
    assert_eq!(checked, MAX_LOGIN_ATTEMPTS as usize + 1);
    assert_eq!(checked + locked, errors.len());

    let err = app.server.sign_in("user1", "abc123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountLocked);
}

#[tokio::test]
async fn test_sign_in_unknown_user() {
    let app = TestApp::new().await;
    let err = app.server.sign_in("nobody", "pw").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserNotFound);
}

#[tokio::test]
async fn test_web_session_lifecycle() {
    let app = TestApp::new().await;
    app.create_test_user("user1", "abc123").await;
    let session = app.server.sign_in("user1", "abc123").await.unwrap();

    let full = app.server.get_web_session("user1", &session.id).await.unwrap();
    assert_eq!(full.bearer_token, session.bearer_token);

    let info = app
        .server
        .get_web_session_info("user1", &session.id)
        .await
        .unwrap();
    assert!(info.bearer_token.is_empty());
    assert!(info.private_key.is_empty());
    assert_eq!(info.id, session.id);

    app.server.delete_web_session("user1", &session.id).await.unwrap();
    let err = app
        .server
        .get_web_session("user1", &session.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    app.server.delete_web_session("user1", &session.id).await.unwrap();
}

#[tokio::test]
async fn test_web_session_expires() {
    let app = TestApp::new().await;
    let session = app.server.create_web_session("user1").await.unwrap();

    app.clock.advance(Duration::from_secs(12 * 3600) - Duration::from_secs(1));
    app.server.get_web_session("user1", &session.id).await.unwrap();

    app.clock.advance(Duration::from_secs(1));
    let err = app
        .server
        .get_web_session_info("user1", &session.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_session_certificate_carries_role_logins() {
    let app = TestApp::new().await;
    app.server
        .upsert_role(
            &Role::new(
                "admin",
                RoleSpec {
                    max_session_ttl: Duration::from_secs(2 * 3600),
                    logins: vec!["root".into()],
                    ..RoleSpec::default()
                },
            )
            .unwrap(),
        )
        .await
        .unwrap();
    app.server
        .upsert_user(&User {
            name: "alice".into(),
            roles: vec!["admin".into()],
            created_by: None,
            created_at: app.server.clock().now(),
        })
        .await
        .unwrap();

    let session = app.server.create_web_session("alice").await.unwrap();
    let cert = UserCertificate::decode(&session.certificate).unwrap();
    assert_eq!(cert.principals, vec!["alice", "root"]);
    app.server.verify_user_cert(&cert).await.unwrap();

    app.clock.advance(Duration::from_secs(2 * 3600));
    assert!(app.server.get_web_session("alice", &session.id).await.is_err());
    assert!(app.server.verify_user_cert(&cert).await.is_err());
}

#[tokio::test]
async fn test_delete_user_ends_sessions() {
    let app = TestApp::new().await;
    app.create_test_user("alice", "pw").await;
    app.server
        .upsert_user(&User {
            name: "alice".into(),
            roles: vec![],
            created_by: None,
            created_at: app.server.clock().now(),
        })
        .await
        .unwrap();
    let session = app.server.sign_in("alice", "pw").await.unwrap();

    app.server.delete_user("alice").await.unwrap();
    assert!(app.server.get_web_session("alice", &session.id).await.is_err());
    let err = app.server.sign_in("alice", "pw").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserNotFound);
}
