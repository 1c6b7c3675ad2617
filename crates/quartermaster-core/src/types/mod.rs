//! Shared value types.

pub mod id;

pub use id::{DamagedItemId, IssuedItemId, ItemId, NotificationId, RequestId, UserId};
