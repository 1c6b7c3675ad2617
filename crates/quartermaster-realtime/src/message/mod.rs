//! Push message parsing.

pub mod parser;

pub use parser::parse_push;
