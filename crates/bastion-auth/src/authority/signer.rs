//! Signing and verification of host and user certificates.

use std::time::Duration;

use chrono::TimeDelta;
use tracing::{debug, warn};
use uuid::Uuid;

use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::types::SystemRole;
use bastion_entity::authority::{
    CertAuthType, HostCertificate, SignedCertificate, UserCertificate, fingerprint,
};

use super::keys::{decode_signing_key, decode_verifying_key, public_key_of, sign, verify};
use super::store::AuthorityStore;

/// Parameters of a host certificate.
#[derive(Debug, Clone)]
pub struct HostCertRequest {
    /// Stable host identifier.
    pub host_id: String,
    /// Human-readable node name.
    pub node_name: String,
    /// Role the host acts in.
    pub role: SystemRole,
    /// Base64 public key being certified.
    pub public_key: String,
}

/// Parameters of a user certificate.
#[derive(Debug, Clone)]
pub struct UserCertRequest {
    /// User the certificate is issued to.
    pub username: String,
    /// Logins the user may assume.
    pub principals: Vec<String>,
    /// Base64 public key being certified.
    pub public_key: String,
    /// Certificate lifetime.
    pub ttl: Duration,
}

impl AuthorityStore {
    /// Signs a host certificate with the local host authority.
    pub async fn generate_host_cert(&self, req: &HostCertRequest) -> AppResult<HostCertificate> {
        decode_verifying_key(&req.public_key)?;
        let now = self.clock.now();
        let mut principals = vec![
            format!("{}.{}", req.host_id, self.cluster_name),
            req.host_id.clone(),
        ];
        if !req.node_name.is_empty() && !principals.contains(&req.node_name) {
            principals.push(req.node_name.clone());
        }

        let valid_before = match self.host_cert_ttl {
            Some(ttl) => Some(
                TimeDelta::from_std(ttl)
                    .ok()
                    .and_then(|ttl| now.checked_add_signed(ttl))
                    .ok_or_else(|| {
                        AppError::configuration(format!("Host certificate TTL {ttl:?} is out of range"))
                    })?,
            ),
            None => None,
        };

        let cert = HostCertificate {
            serial: Uuid::new_v4().to_string(),
            cluster_name: self.cluster_name.clone(),
            host_id: req.host_id.clone(),
            node_name: req.node_name.clone(),
            role: req.role,
            principals,
            public_key: req.public_key.clone(),
            valid_after: now,
            valid_before,
            signed_by: String::new(),
            signature: String::new(),
        };
        self.sign_certificate(CertAuthType::Host, cert).await
    }

    /// Signs a user certificate with the local user authority.
    pub async fn generate_user_cert(&self, req: &UserCertRequest) -> AppResult<UserCertificate> {
        decode_verifying_key(&req.public_key)?;
        let now = self.clock.now();
        let valid_before = TimeDelta::from_std(req.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::validation(format!("Certificate TTL {:?} is out of range", req.ttl))
            })?;

        let cert = UserCertificate {
            serial: Uuid::new_v4().to_string(),
            cluster_name: self.cluster_name.clone(),
            username: req.username.clone(),
            principals: req.principals.clone(),
            public_key: req.public_key.clone(),
            valid_after: now,
            valid_before: Some(valid_before),
            signed_by: String::new(),
            signature: String::new(),
        };
        self.sign_certificate(CertAuthType::User, cert).await
    }

    /// Checks a host certificate against the host authority of its cluster.
    pub async fn verify_host_cert(&self, cert: &HostCertificate) -> AppResult<()> {
        self.verify_certificate(CertAuthType::Host, cert).await
    }

    /// Checks a user certificate against the user authority of its cluster.
    pub async fn verify_user_cert(&self, cert: &UserCertificate) -> AppResult<()> {
        self.verify_certificate(CertAuthType::User, cert).await
    }

    async fn sign_certificate<C: SignedCertificate>(
        &self,
        kind: CertAuthType,
        mut cert: C,
    ) -> AppResult<C> {
        let ca = self
            .get_cert_authority(kind, &self.cluster_name, true)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AppError::invalid_trust_material(e.message)
                } else {
                    e
                }
            })?;
        let encoded = ca.signing_keys.first().ok_or_else(|| {
            AppError::invalid_trust_material(format!("{} has no signing keys", ca.id()))
        })?;

        let signing_key = decode_signing_key(encoded)?;
        let payload = cert.signing_payload()?;
        let signature = sign(&signing_key, &payload);
        cert.set_signature(signature, fingerprint(&public_key_of(&signing_key)));
        debug!(kind = %kind, cluster = %self.cluster_name, "Certificate signed");
        Ok(cert)
    }

    async fn verify_certificate<C: SignedCertificate>(
        &self,
        kind: CertAuthType,
        cert: &C,
    ) -> AppResult<()> {
        let cluster = cert.cluster_name();
        let ca = self
            .get_cert_authority(kind, cluster, false)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AppError::invalid_trust_material(format!(
                        "No {kind} authority trusted for cluster '{cluster}'"
                    ))
                } else {
                    e
                }
            })?;
        if ca.checking_keys.is_empty() {
            return Err(AppError::invalid_trust_material(format!(
                "{} has no checking keys",
                ca.id()
            )));
        }
        if !cert.is_valid_at(self.clock.now()) {
            return Err(AppError::invalid_trust_material(format!(
                "Certificate from cluster '{cluster}' is outside its validity period"
            )));
        }

        let payload = cert.signing_payload()?;
        for key in &ca.checking_keys {
            let Ok(checking_key) = decode_verifying_key(key) else {
                continue;
            };
            if verify(&checking_key, &payload, cert.signature()) {
                return Ok(());
            }
        }
        warn!(kind = %kind, cluster = %cluster, "Certificate signature rejected");
        Err(AppError::invalid_trust_material(format!(
            "Certificate signature does not match any {kind} checking key of cluster '{cluster}'"
        )))
    }
}
