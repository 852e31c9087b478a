//! Per-cluster certificate authorities and the certificates they sign.

pub mod keys;
pub mod signer;
pub mod store;

pub use keys::KeyPair;
pub use signer::{HostCertRequest, UserCertRequest};
pub use store::AuthorityStore;
