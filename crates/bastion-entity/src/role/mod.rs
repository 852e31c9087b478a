//! Roles assigned to users.

pub mod model;

pub use model::{Role, RoleSpec};
