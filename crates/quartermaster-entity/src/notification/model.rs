//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quartermaster_core::types::id::{NotificationId, RequestId, UserId};

use super::kind::NotificationKind;

/// A notification delivered to a user, either pushed live or fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Server-assigned identifier; the deduplication key.
    pub id: NotificationId,
    /// Human-readable text.
    pub message: String,
    /// Categorical tag.
    pub kind: NotificationKind,
    /// Whether the recipient has read it.
    pub read: bool,
    /// Set by the server at emission.
    pub created_at: DateTime<Utc>,
    /// The user this event targets.
    pub recipient_id: UserId,
    /// The request the event is about, when the server says so.
    pub request_id: Option<RequestId>,
}

impl NotificationEvent {
    /// Check if the notification has not been read yet.
    pub fn is_unread(&self) -> bool {
        !self.read
    }
}
