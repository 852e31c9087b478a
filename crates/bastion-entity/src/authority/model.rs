//! Certificate authority entity model.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which kind of certificates an authority signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertAuthType {
    /// Signs host certificates for cluster members.
    Host,
    /// Signs user certificates for web sessions.
    User,
}

impl CertAuthType {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::User => "user",
        }
    }
}

impl fmt::Display for CertAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lookup key of a certificate authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertAuthId {
    /// Authority kind.
    pub kind: CertAuthType,
    /// Trust domain.
    pub cluster_name: String,
}

impl fmt::Display for CertAuthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} authority of cluster '{}'", self.kind, self.cluster_name)
    }
}

/// Key material of one trust domain for one certificate kind.
///
/// Checking keys are base64 Ed25519 public keys; signing keys are base64
/// 32-byte Ed25519 seeds. The record is always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAuthority {
    /// Authority kind.
    pub kind: CertAuthType,
    /// Trust domain.
    pub cluster_name: String,
    /// Public keys that verify certificates.
    pub checking_keys: Vec<String>,
    /// Private keys that mint certificates. Only the owning cluster holds these.
    #[serde(default)]
    pub signing_keys: Vec<String>,
}

impl CertAuthority {
    /// Return the lookup key.
    pub fn id(&self) -> CertAuthId {
        CertAuthId {
            kind: self.kind,
            cluster_name: self.cluster_name.clone(),
        }
    }

    /// Copy of the authority with private keys removed.
    pub fn without_secrets(&self) -> Self {
        Self {
            signing_keys: Vec::new(),
            ..self.clone()
        }
    }

    /// Whether this authority can mint certificates.
    pub fn can_sign(&self) -> bool {
        !self.signing_keys.is_empty()
    }

    /// SHA-256 fingerprints of the checking keys, in key order.
    pub fn fingerprints(&self) -> Vec<String> {
        self.checking_keys.iter().map(|key| fingerprint(key)).collect()
    }
}

/// `SHA256:<base64>` fingerprint of an encoded public key.
pub fn fingerprint(public_key: &str) -> String {
    let digest = Sha256::digest(public_key.trim().as_bytes());
    format!("SHA256:{}", STANDARD.encode(digest))
}
