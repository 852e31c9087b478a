//! Certificate authorities and the certificates they sign.

pub mod certificate;
pub mod model;

pub use certificate::{HostCertificate, PackedKeys, SignedCertificate, UserCertificate};
pub use model::{CertAuthId, CertAuthType, CertAuthority, fingerprint};
