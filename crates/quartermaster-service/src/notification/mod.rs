//! Notification inbox: the deduplicating in-memory store and its REST sync.

pub mod inbox;
pub mod service;
pub mod store;

pub use inbox::NotificationInbox;
pub use service::{HttpNotificationApi, NotificationApi, NotificationRecord};
pub use store::NotificationStore;
