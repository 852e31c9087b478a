//! Mapping of federated identity claims to roles.

pub mod mapper;
pub mod template;

pub use mapper::{DEFAULT_TEMPLATED_ROLE_TTL, IdentityMapper};
pub use template::render;
