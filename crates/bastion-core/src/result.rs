//! Convenience result type alias for Bastion.

use crate::error::AppError;

/// A specialized `Result` type for Bastion operations.
pub type AppResult<T> = Result<T, AppError>;
