//! The user's notification inbox.

use std::sync::Arc;

use tracing::{debug, info};

use quartermaster_core::AppResult;
use quartermaster_core::types::id::NotificationId;
use quartermaster_entity::notification::NotificationEvent;

use crate::context::SessionContext;

use super::service::NotificationApi;
use super::store::NotificationStore;

/// Keeps the in-memory store in step with the server.
///
/// Read flags are flipped locally only after the server accepted the
/// change, so a failed call never leaves the store ahead of the backend.
#[derive(Clone)]
pub struct NotificationInbox {
    /// Server operations.
    api: Arc<dyn NotificationApi>,
    /// Local cache shared with the live channel.
    store: Arc<NotificationStore>,
}

impl std::fmt::Debug for NotificationInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationInbox")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl NotificationInbox {
    /// Creates a new inbox.
    pub fn new(api: Arc<dyn NotificationApi>, store: Arc<NotificationStore>) -> Self {
        Self { api, store }
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Load the persisted notifications, replacing the local list.
    pub async fn fetch(&self, ctx: &SessionContext) -> AppResult<Vec<NotificationEvent>> {
        ctx.ensure_authenticated()?;
        let events = self.api.list(ctx).await?;
        self.store.replace_all(events);
        debug!(
            user_id = %ctx.user_id,
            count = self.store.len(),
            unread = self.store.unread_count(),
            "Notifications loaded"
        );
        Ok(self.store.snapshot())
    }

    /// Mark one notification as read.
    pub async fn mark_read(&self, ctx: &SessionContext, id: &NotificationId) -> AppResult<()> {
        ctx.ensure_authenticated()?;
        self.api.mark_read(ctx, id).await?;
        self.store.mark_read(id);
        Ok(())
    }

    /// Mark every notification as read. Returns how many local entries changed.
    pub async fn mark_all_read(&self, ctx: &SessionContext) -> AppResult<usize> {
        ctx.ensure_authenticated()?;
        self.api.mark_all_read(ctx).await?;
        let changed = self.store.mark_all_read();
        info!(user_id = %ctx.user_id, changed, "All notifications marked read");
        Ok(changed)
    }

    /// Unread count of the local list.
    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    /// Drop the local list.
    pub fn clear(&self) {
        self.store.clear();
    }
}
