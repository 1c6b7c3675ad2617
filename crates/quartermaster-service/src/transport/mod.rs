//! Transport to the logistics backend.

pub mod http;

pub use http::ApiClient;
