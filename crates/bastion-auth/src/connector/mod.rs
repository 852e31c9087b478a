//! OIDC connector persistence.

pub mod store;

pub use store::ConnectorStore;
