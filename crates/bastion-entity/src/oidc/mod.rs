//! Federated identity connectors and the claims they assert.

pub mod claims;
pub mod connector;

pub use claims::Claims;
pub use connector::{ClaimMapping, MappingAction, OidcConnector, RoleTemplate};
