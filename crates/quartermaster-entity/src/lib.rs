//! # quartermaster-entity
//!
//! Domain entity models for Quartermaster. Every struct in this crate
//! mirrors a backend resource or a domain value object, and derives
//! `Debug`, `Clone`, `Serialize` and `Deserialize`.
//!
//! The request transition rules live here as pure functions so that the
//! lifecycle manager, the CLI and the tests all agree on one graph.

pub mod notification;
pub mod request;
pub mod stock;
pub mod user;
