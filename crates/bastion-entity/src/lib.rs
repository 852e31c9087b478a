//! # bastion-entity
//!
//! Domain entity models for the Bastion trust core. Every struct in this
//! crate is a record persisted through the backend or a value object passed
//! between components. All entities derive `Debug`, `Clone`, `Serialize`
//! and `Deserialize`.

pub mod authority;
pub mod oidc;
pub mod role;
pub mod session;
pub mod token;
pub mod user;
