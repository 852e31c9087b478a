//! Provisioning tokens and node registration.

pub mod registry;
pub mod source;

pub use registry::{MAX_TOKEN_LEN, RegisterRequest, TOKEN_LEN_BYTES, TokenRegistry};
pub use source::{DynamicTokens, StaticTokens, TokenOrigin, TokenSource};
