//! User records.

pub mod store;

pub use store::UserStore;
