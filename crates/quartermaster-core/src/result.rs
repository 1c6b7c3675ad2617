//! Convenience result type alias for Quartermaster.

use crate::error::AppError;

/// A specialized `Result` type for Quartermaster operations.
pub type AppResult<T> = Result<T, AppError>;
