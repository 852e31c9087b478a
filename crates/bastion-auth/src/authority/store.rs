//! Certificate authority persistence.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use bastion_backend::keys;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, BackendExt, Clock};
use bastion_core::types::Ttl;
use bastion_entity::authority::{CertAuthType, CertAuthority};

use super::keys::{decode_signing_key, decode_verifying_key, generate_key_pair, public_key_of};

/// Stores host and user authorities and signs certificates for the local
/// cluster.
#[derive(Debug, Clone)]
pub struct AuthorityStore {
    pub(super) backend: Arc<dyn Backend>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) cluster_name: String,
    pub(super) host_cert_ttl: Option<Duration>,
}

impl AuthorityStore {
    /// Creates a store signing on behalf of `cluster_name`.
    ///
    /// Host certificates are unbounded when `host_cert_ttl` is `None`.
    pub fn new(
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        cluster_name: impl Into<String>,
        host_cert_ttl: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            clock,
            cluster_name: cluster_name.into(),
            host_cert_ttl,
        }
    }

    /// Name of the local cluster.
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Validates and stores an authority, replacing any existing record for
    /// the same cluster and kind.
    pub async fn upsert_cert_authority(&self, ca: &CertAuthority, ttl: Ttl) -> AppResult<()> {
        check_authority(ca)?;
        self.backend
            .put_json(&keys::authority(ca.kind.as_str(), &ca.cluster_name), ca, ttl)
            .await?;
        info!(
            kind = %ca.kind,
            cluster = %ca.cluster_name,
            checking_keys = ca.checking_keys.len(),
            signing_keys = ca.signing_keys.len(),
            "Certificate authority stored"
        );
        Ok(())
    }

    /// Loads one authority. Signing keys are stripped unless requested.
    pub async fn get_cert_authority(
        &self,
        kind: CertAuthType,
        cluster_name: &str,
        load_signing_keys: bool,
    ) -> AppResult<CertAuthority> {
        let ca: CertAuthority = self
            .backend
            .get_json(&keys::authority(kind.as_str(), cluster_name))
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "{kind} authority of cluster '{cluster_name}' not found"
                ))
            })?;
        Ok(if load_signing_keys {
            ca
        } else {
            ca.without_secrets()
        })
    }

    /// Loads every authority of a kind, ordered by cluster name.
    pub async fn get_cert_authorities(
        &self,
        kind: CertAuthType,
        load_signing_keys: bool,
    ) -> AppResult<Vec<CertAuthority>> {
        let authorities: Vec<CertAuthority> =
            self.backend.list_json(&keys::authorities(kind.as_str())).await?;
        Ok(authorities
            .into_iter()
            .map(|ca| if load_signing_keys { ca } else { ca.without_secrets() })
            .collect())
    }

    /// Removes an authority.
    pub async fn delete_cert_authority(
        &self,
        kind: CertAuthType,
        cluster_name: &str,
    ) -> AppResult<()> {
        if !self
            .backend
            .delete(&keys::authority(kind.as_str(), cluster_name))
            .await?
        {
            return Err(AppError::not_found(format!(
                "{kind} authority of cluster '{cluster_name}' not found"
            )));
        }
        info!(kind = %kind, cluster = %cluster_name, "Certificate authority deleted");
        Ok(())
    }

    /// Generates a fresh key pair and stores it as the authority of
    /// `cluster_name`.
    pub async fn generate_cert_authority(
        &self,
        kind: CertAuthType,
        cluster_name: &str,
    ) -> AppResult<CertAuthority> {
        let pair = generate_key_pair();
        let ca = CertAuthority {
            kind,
            cluster_name: cluster_name.to_string(),
            checking_keys: vec![pair.public_key],
            signing_keys: vec![pair.private_key],
        };
        self.upsert_cert_authority(&ca, Ttl::Forever).await?;
        Ok(ca)
    }
}

fn check_authority(ca: &CertAuthority) -> AppResult<()> {
    if ca.cluster_name.trim().is_empty() || ca.cluster_name.contains('/') {
        return Err(AppError::invalid_trust_material(format!(
            "Invalid cluster name '{}'",
            ca.cluster_name
        )));
    }
    if ca.checking_keys.is_empty() {
        return Err(AppError::invalid_trust_material(format!(
            "{} has no checking keys",
            ca.id()
        )));
    }
    for key in &ca.checking_keys {
        decode_verifying_key(key)?;
    }
    for key in &ca.signing_keys {
        let public = public_key_of(&decode_signing_key(key)?);
        if !ca.checking_keys.iter().any(|k| k.trim() == public) {
            return Err(AppError::invalid_trust_material(format!(
                "{} has a signing key without a matching checking key",
                ca.id()
            )));
        }
    }
    Ok(())
}
