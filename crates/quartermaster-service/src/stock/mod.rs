//! Stock collaborator used by the lifecycle manager.

pub mod gateway;

pub use gateway::{HttpStockGateway, StockGateway};
