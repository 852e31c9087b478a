//! Integration tests for certificate authorities.

mod helpers;

use std::time::Duration;

use bastion_auth::authority::HostCertRequest;
use bastion_auth::authority::keys::generate_key_pair;
use bastion_backend::keys;
use bastion_core::ErrorKind;
use bastion_core::traits::BackendExt;
use bastion_core::types::{Roles, SystemRole, Ttl};
use bastion_entity::authority::{CertAuthType, CertAuthority, HostCertificate, SignedCertificate};

use helpers::{CLUSTER, TestApp, join_request};

fn remote_authority(kind: CertAuthType) -> CertAuthority {
    CertAuthority {
        kind,
        cluster_name: "remote.example".into(),
        checking_keys: vec![generate_key_pair().public_key],
        signing_keys: vec![],
    }
}

#[tokio::test]
async fn test_authority_crud() {
    let app = TestApp::new().await;
    let remote = remote_authority(CertAuthType::Host);
    app.server
        .upsert_cert_authority(&remote, Ttl::Forever)
        .await
        .unwrap();

    let all = app
        .server
        .get_cert_authorities(CertAuthType::Host, false)
        .await
        .unwrap();
    let clusters: Vec<&str> = all.iter().map(|ca| ca.cluster_name.as_str()).collect();
    assert_eq!(clusters, vec![CLUSTER, "remote.example"]);
    assert!(all.iter().all(|ca| ca.signing_keys.is_empty()));

    let local = app
        .server
        .get_cert_authority(CertAuthType::Host, CLUSTER, true)
        .await
        .unwrap();
    assert!(local.can_sign());
    assert_eq!(local.fingerprints().len(), 1);

    app.server
        .delete_cert_authority(CertAuthType::Host, "remote.example")
        .await
        .unwrap();
    let err = app
        .server
        .get_cert_authority(CertAuthType::Host, "remote.example", false)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_authority_with_ttl_expires() {
    let app = TestApp::new().await;
    app.server
        .upsert_cert_authority(
            &remote_authority(CertAuthType::User),
            Ttl::For(Duration::from_secs(600)),
        )
        .await
        .unwrap();

    app.clock.advance(Duration::from_secs(600));
    let err = app
        .server
        .get_cert_authority(CertAuthType::User, "remote.example", false)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_invalid_authority_rejected() {
    let app = TestApp::new().await;
    let mut ca = remote_authority(CertAuthType::Host);
    ca.signing_keys = vec![generate_key_pair().private_key];

    let err = app
        .server
        .upsert_cert_authority(&ca, Ttl::Forever)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTrustMaterial);
}

#[tokio::test]
async fn test_verification_without_checking_keys_fails() {
    let app = TestApp::new().await;
    let tok = app
        .server
        .generate_token(Roles::new([SystemRole::Node]), Duration::ZERO)
        .await
        .unwrap();
    let packed = app
        .server
        .register_using_token(&join_request(&tok, "host-1", "node-1", SystemRole::Node))
        .await
        .unwrap();
    let cert = HostCertificate::decode(&packed.cert).unwrap();

    // Records written around validation, as a damaged store would hold them.
    let mut emptied = app
        .server
        .get_cert_authority(CertAuthType::Host, CLUSTER, true)
        .await
        .unwrap();
    emptied.checking_keys.clear();
    app.backend
        .put_json(&keys::authority("host", CLUSTER), &emptied, Ttl::Forever)
        .await
        .unwrap();

    let err = app.server.verify_host_cert(&cert).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTrustMaterial);
}

#[tokio::test]
async fn test_signing_without_authority_fails() {
    let app = TestApp::new().await;
    app.server
        .delete_cert_authority(CertAuthType::Host, CLUSTER)
        .await
        .unwrap();

    let err = app
        .server
        .generate_host_cert(&HostCertRequest {
            host_id: "host-1".into(),
            node_name: "node-1".into(),
            role: SystemRole::Node,
            public_key: generate_key_pair().public_key,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTrustMaterial);
}

#[tokio::test]
async fn test_foreign_certificate_is_not_trusted() {
    let app = TestApp::new().await;
    let cert = app
        .server
        .generate_host_cert(&HostCertRequest {
            host_id: "host-1".into(),
            node_name: "node-1".into(),
            role: SystemRole::Proxy,
            public_key: generate_key_pair().public_key,
        })
        .await
        .unwrap();
    app.server.verify_host_cert(&cert).await.unwrap();

    let mut foreign = cert.clone();
    foreign.cluster_name = "remote.example".into();
    let err = app.server.verify_host_cert(&foreign).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTrustMaterial);
}
