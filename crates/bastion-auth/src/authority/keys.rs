//! Ed25519 key material helpers.
//!
//! Private keys are raw 32-byte seeds and public keys raw 32-byte points,
//! both base64 encoded. The public key is always derived from the seed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use bastion_core::error::AppError;
use bastion_core::result::AppResult;

/// A freshly generated key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Base64 private seed.
    pub private_key: String,
    /// Base64 public key.
    pub public_key: String,
}

/// Generate a new Ed25519 key pair from the OS random source.
pub fn generate_key_pair() -> KeyPair {
    let signing_key = SigningKey::from_bytes(&rand::random::<[u8; 32]>());
    KeyPair {
        private_key: STANDARD.encode(signing_key.to_bytes()),
        public_key: STANDARD.encode(signing_key.verifying_key().to_bytes()),
    }
}

fn decode_32(encoded: &str, what: &str) -> AppResult<[u8; 32]> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::invalid_trust_material(format!("Malformed {what}: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        AppError::invalid_trust_material(format!(
            "Malformed {what}: expected 32 bytes, got {}",
            bytes.len()
        ))
    })
}

/// Decode a base64 private seed.
pub fn decode_signing_key(encoded: &str) -> AppResult<SigningKey> {
    Ok(SigningKey::from_bytes(&decode_32(encoded, "signing key")?))
}

/// Decode a base64 public key.
pub fn decode_verifying_key(encoded: &str) -> AppResult<VerifyingKey> {
    VerifyingKey::from_bytes(&decode_32(encoded, "checking key")?)
        .map_err(|e| AppError::invalid_trust_material(format!("Malformed checking key: {e}")))
}

/// Base64 public key matching a base64 private seed.
pub fn public_key_of(signing_key: &SigningKey) -> String {
    STANDARD.encode(signing_key.verifying_key().to_bytes())
}

/// Sign `payload`, returning a base64 signature.
pub fn sign(signing_key: &SigningKey, payload: &[u8]) -> String {
    STANDARD.encode(signing_key.sign(payload).to_bytes())
}

/// Whether `signature` over `payload` verifies with `checking_key`.
pub fn verify(checking_key: &VerifyingKey, payload: &[u8], signature: &str) -> bool {
    let Ok(bytes) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&bytes) else {
        return false;
    };
    checking_key.verify(payload, &signature).is_ok()
}
