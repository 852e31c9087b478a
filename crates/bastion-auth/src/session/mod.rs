//! Password sign-in, failed-attempt lockout and web sessions.

pub mod lockout;
pub mod manager;
pub mod store;

pub use lockout::{LockoutPolicy, LockoutTracker};
pub use manager::SessionManager;
pub use store::WebSessionStore;
