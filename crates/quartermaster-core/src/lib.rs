//! # quartermaster-core
//!
//! Core crate for Quartermaster. Contains configuration schemas,
//! typed identifiers, request domain events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Quartermaster crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
