//! Stock domain entities.

pub mod model;

pub use model::{DamagedItem, ItemStatus, StockItem};
