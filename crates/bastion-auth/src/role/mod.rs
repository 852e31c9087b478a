//! Role persistence.

pub mod store;

pub use store::RoleStore;
