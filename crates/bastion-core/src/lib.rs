//! # bastion-core
//!
//! Core crate for Bastion. Contains the storage and clock traits,
//! configuration schemas, shared role types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Bastion crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
