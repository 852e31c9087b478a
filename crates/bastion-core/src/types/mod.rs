//! Shared value types.

pub mod roles;
pub mod ttl;

pub use roles::{Roles, SystemRole};
pub use ttl::Ttl;
