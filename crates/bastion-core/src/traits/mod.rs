//! Core traits defined in `bastion-core` and implemented by other crates.

pub mod backend;
pub mod clock;

pub use backend::{Backend, BackendExt};
pub use clock::{Clock, FakeClock, SystemClock};
