//! Host and user certificates signed by a [`CertAuthority`](super::CertAuthority).
//!
//! A certificate is signed over its canonical JSON form with the
//! `signature` field emptied, and travels as base64 of its JSON.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::types::SystemRole;

/// Common behaviour of every certificate a cluster authority signs.
pub trait SignedCertificate: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Trust domain that signed the certificate.
    fn cluster_name(&self) -> &str;

    /// Base64 signature, empty until signed.
    fn signature(&self) -> &str;

    /// Attach a signature and the fingerprint of the key that produced it.
    fn set_signature(&mut self, signature: String, signed_by: String);

    /// Start of the validity period.
    fn valid_after(&self) -> DateTime<Utc>;

    /// End of the validity period, if bounded.
    fn valid_before(&self) -> Option<DateTime<Utc>>;

    /// Bytes covered by the signature.
    fn signing_payload(&self) -> AppResult<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.set_signature(String::new(), String::new());
        Ok(serde_json::to_vec(&unsigned)?)
    }

    /// Whether `now` lies inside the validity period.
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_after() && self.valid_before().is_none_or(|end| now < end)
    }

    /// Encode for transport.
    fn encode(&self) -> AppResult<String> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Decode from transport form.
    fn decode(encoded: &str) -> AppResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::invalid_trust_material(format!("Malformed certificate: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::invalid_trust_material(format!("Malformed certificate: {e}")))
    }
}

/// Certificate identifying a cluster member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCertificate {
    /// Random serial number.
    pub serial: String,
    /// Signing trust domain.
    pub cluster_name: String,
    /// Stable host identifier.
    pub host_id: String,
    /// Human-readable node name.
    pub node_name: String,
    /// Role the host joined with.
    pub role: SystemRole,
    /// Names the host may be addressed by.
    pub principals: Vec<String>,
    /// Base64 Ed25519 public key of the host.
    pub public_key: String,
    /// Start of validity.
    pub valid_after: DateTime<Utc>,
    /// End of validity; `None` means unbounded.
    pub valid_before: Option<DateTime<Utc>>,
    /// Fingerprint of the signing key.
    #[serde(default)]
    pub signed_by: String,
    /// Base64 Ed25519 signature.
    #[serde(default)]
    pub signature: String,
}

impl SignedCertificate for HostCertificate {
    fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    fn signature(&self) -> &str {
        &self.signature
    }

    fn set_signature(&mut self, signature: String, signed_by: String) {
        self.signature = signature;
        self.signed_by = signed_by;
    }

    fn valid_after(&self) -> DateTime<Utc> {
        self.valid_after
    }

    fn valid_before(&self) -> Option<DateTime<Utc>> {
        self.valid_before
    }
}

/// Certificate backing a user's web session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCertificate {
    /// Random serial number.
    pub serial: String,
    /// Signing trust domain.
    pub cluster_name: String,
    /// User the certificate was issued to.
    pub username: String,
    /// OS logins the user may assume.
    pub principals: Vec<String>,
    /// Base64 Ed25519 public key of the session.
    pub public_key: String,
    /// Start of validity.
    pub valid_after: DateTime<Utc>,
    /// End of validity.
    pub valid_before: Option<DateTime<Utc>>,
    /// Fingerprint of the signing key.
    #[serde(default)]
    pub signed_by: String,
    /// Base64 Ed25519 signature.
    #[serde(default)]
    pub signature: String,
}

impl SignedCertificate for UserCertificate {
    fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    fn signature(&self) -> &str {
        &self.signature
    }

    fn set_signature(&mut self, signature: String, signed_by: String) {
        self.signature = signature;
        self.signed_by = signed_by;
    }

    fn valid_after(&self) -> DateTime<Utc> {
        self.valid_after
    }

    fn valid_before(&self) -> Option<DateTime<Utc>> {
        self.valid_before
    }
}

/// Credentials handed to a node that joined the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedKeys {
    /// Base64 Ed25519 private seed of the node.
    pub key: String,
    /// Encoded [`HostCertificate`].
    pub cert: String,
}
