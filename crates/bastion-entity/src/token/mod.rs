//! Provisioning tokens.

pub mod model;
pub mod static_token;

pub use model::{MAX_TOKEN_LEN, ProvisionToken, is_token_char};
pub use static_token::parse_static_token;
