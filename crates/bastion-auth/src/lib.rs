//! # bastion-auth
//!
//! Trust-and-identity components of a Bastion cluster:
//!
//! - [`authority`] holds per-cluster certificate authorities and signs host
//!   and user certificates.
//! - [`provision`] validates bootstrap tokens and registers new cluster
//!   members.
//! - [`session`] verifies passwords, tracks failed attempts and issues web
//!   sessions.
//! - [`oidc`] maps federated identity claims to roles.
//! - [`server`] is the [`AuthServer`] façade wiring all of the above.

pub mod authority;
pub mod connector;
pub mod oidc;
pub mod password;
pub mod provision;
pub mod role;
pub mod server;
pub mod session;
pub mod user;

pub use server::{AuthServer, AuthServerConfig, OidcAuthResponse};
