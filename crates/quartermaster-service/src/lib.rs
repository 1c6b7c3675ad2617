//! # quartermaster-service
//!
//! Client-side service layer for Quartermaster. Each service talks to the
//! logistics backend through a collaborator trait and keeps a process-local
//! cache that is only updated after the backend confirms a change.
//!
//! Services follow constructor injection: all collaborators are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod notification;
pub mod request;
pub mod session;
pub mod stock;
pub mod transport;

pub use context::SessionContext;
pub use notification::{HttpNotificationApi, NotificationApi, NotificationInbox, NotificationStore};
pub use request::{HttpRequestBackend, LifecycleManager, RequestBackend, RequestCache};
pub use session::ClientSession;
pub use stock::{HttpStockGateway, StockGateway};
pub use transport::ApiClient;
