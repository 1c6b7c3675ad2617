//! Owned client state for one logged-in session.

use std::sync::Arc;

use tracing::info;

use quartermaster_core::AppResult;
use quartermaster_core::config::AppConfig;

use crate::context::SessionContext;
use crate::notification::{HttpNotificationApi, NotificationApi, NotificationInbox, NotificationStore};
use crate::request::{HttpRequestBackend, LifecycleManager, RequestBackend, RequestCache};
use crate::stock::{HttpStockGateway, StockGateway};
use crate::transport::ApiClient;

/// Everything a logged-in client holds: who it is, its caches and the
/// services that write to them.
///
/// The caches are populated after login and emptied by [`ClientSession::clear`]
/// on logout, so nothing outlives the session that owns it.
#[derive(Debug, Clone)]
pub struct ClientSession {
    /// Identity and token.
    pub context: SessionContext,
    /// Notification list shared with the live channel.
    pub notifications: Arc<NotificationStore>,
    /// Request cache.
    pub requests: Arc<RequestCache>,
    /// Notification REST sync.
    pub inbox: NotificationInbox,
    /// Request transitions.
    pub lifecycle: LifecycleManager,
}

impl ClientSession {
    /// Wire a session from its collaborators.
    pub fn new(
        context: SessionContext,
        notification_api: Arc<dyn NotificationApi>,
        request_backend: Arc<dyn RequestBackend>,
        stock: Arc<dyn StockGateway>,
    ) -> Self {
        let notifications = Arc::new(NotificationStore::new());
        let requests = Arc::new(RequestCache::new());
        Self {
            inbox: NotificationInbox::new(notification_api, Arc::clone(&notifications)),
            lifecycle: LifecycleManager::new(request_backend, stock, Arc::clone(&requests)),
            context,
            notifications,
            requests,
        }
    }

    /// Wire a session against the HTTP backend described by `config`.
    pub fn connect(config: &AppConfig) -> AppResult<Self> {
        let context = SessionContext::from_config(&config.auth)?;
        let client = ApiClient::new(&config.api)?;
        info!(
            user_id = %context.user_id,
            role = %context.role,
            base_url = %client.base_url(),
            "Session established"
        );
        Ok(Self::new(
            context,
            Arc::new(HttpNotificationApi::new(client.clone())),
            Arc::new(HttpRequestBackend::new(client.clone())),
            Arc::new(HttpStockGateway::new(client)),
        ))
    }

    /// Empty all caches. Called on logout.
    pub fn clear(&self) {
        self.notifications.clear();
        self.requests.clear();
        info!(user_id = %self.context.user_id, "Session cleared");
    }
}
