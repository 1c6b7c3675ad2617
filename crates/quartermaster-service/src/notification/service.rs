//! REST access to persisted notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use quartermaster_core::AppResult;
use quartermaster_core::types::id::{NotificationId, RequestId, UserId};
use quartermaster_entity::notification::{NotificationEvent, NotificationKind};

use crate::context::SessionContext;
use crate::transport::ApiClient;

/// Notification as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    /// Server id.
    pub id: NotificationId,
    /// Text.
    pub message: String,
    /// Categorical tag.
    #[serde(default)]
    pub notification_type: Option<String>,
    /// Read flag.
    #[serde(default)]
    pub is_read: bool,
    /// Emission time.
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Recipient.
    #[serde(default, alias = "user")]
    pub recipient: Option<UserId>,
    /// Related request.
    #[serde(default)]
    pub request: Option<RequestId>,
}

impl NotificationRecord {
    /// Convert into the domain event, defaulting the recipient to `owner`.
    pub fn into_event(self, owner: &UserId) -> NotificationEvent {
        NotificationEvent {
            id: self.id,
            message: self.message,
            kind: self
                .notification_type
                .map(NotificationKind::from)
                .unwrap_or_else(|| NotificationKind::Other("info".to_string())),
            read: self.is_read,
            created_at: self.created_at,
            recipient_id: self.recipient.unwrap_or_else(|| owner.clone()),
            request_id: self.request,
        }
    }
}

/// List endpoints answer either a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListResponse<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paged { results: items } => items,
        }
    }
}

/// Server-side notification operations.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch the user's notifications, newest first.
    async fn list(&self, ctx: &SessionContext) -> AppResult<Vec<NotificationEvent>>;

    /// Persist the read flag of one notification.
    async fn mark_read(&self, ctx: &SessionContext, id: &NotificationId) -> AppResult<()>;

    /// Persist the read flag of every notification of the user.
    async fn mark_all_read(&self, ctx: &SessionContext) -> AppResult<()>;
}

/// [`NotificationApi`] over the REST transport.
#[derive(Debug, Clone)]
pub struct HttpNotificationApi {
    client: ApiClient,
}

impl HttpNotificationApi {
    /// Creates a new notification API client.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(&self, ctx: &SessionContext) -> AppResult<Vec<NotificationEvent>> {
        let records: ListResponse<NotificationRecord> = self
            .client
            .get(ctx, "notifications/", &[("user", ctx.user_id.as_str())])
            .await?;
        Ok(records
            .into_vec()
            .into_iter()
            .map(|r| r.into_event(&ctx.user_id))
            .collect())
    }

    async fn mark_read(&self, ctx: &SessionContext, id: &NotificationId) -> AppResult<()> {
        let _: serde_json::Value = self
            .client
            .patch(ctx, &format!("notifications/{id}/mark_as_read/"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn mark_all_read(&self, ctx: &SessionContext) -> AppResult<()> {
        let _: serde_json::Value = self
            .client
            .post(ctx, "notifications/mark_all_as_read/", &serde_json::json!({}))
            .await?;
        Ok(())
    }
}
