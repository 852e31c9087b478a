//! # bastion-backend
//!
//! Backend implementations for Bastion and the key layout every component
//! stores its records under.
//!
//! - **memory**: in-process store over [dashmap](https://crates.io/crates/dashmap)
//!   with expiry evaluated against the injected clock
//!
//! The backend is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;

#[cfg(feature = "memory")]
pub use memory::MemoryBackend;
pub use provider::BackendManager;
