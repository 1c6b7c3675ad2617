//! Request lifecycle: backend access, local cache and the transition manager.

pub mod backend;
pub mod cache;
pub mod lifecycle;

pub use backend::{HttpRequestBackend, RequestBackend};
pub use cache::RequestCache;
pub use lifecycle::LifecycleManager;
