//! User domain entities.

pub mod role;

pub use role::{Permission, UserRole};
