//! Web sessions and failed login bookkeeping.

pub mod attempts;
pub mod model;

pub use attempts::LoginAttempts;
pub use model::WebSession;
