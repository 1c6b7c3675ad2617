//! Push payload parsing.
//!
//! Two shapes are accepted:
//!
//! ```text
//! { "message", "notification_type", "data": { "notification_id", "created_at", "request_id"? } }
//! { "id", "message", "notification_type", "created_at", "is_read"? }
//! ```
//!
//! Anything else, including a payload without a notification id, is
//! rejected as malformed.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use quartermaster_core::types::id::{NotificationId, RequestId, UserId};
use quartermaster_core::{AppError, AppResult};
use quartermaster_entity::notification::{NotificationEvent, NotificationKind};

/// Maximum accepted payload size in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 65_536;

#[derive(Debug, Deserialize)]
struct PushData {
    notification_id: NotificationId,
    created_at: DateTime<Utc>,
    #[serde(default)]
    request_id: Option<RequestId>,
    #[serde(default, alias = "user_id")]
    recipient: Option<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePush {
    Nested {
        message: String,
        #[serde(default)]
        notification_type: Option<String>,
        data: PushData,
    },
    Flat {
        id: NotificationId,
        message: String,
        #[serde(default)]
        notification_type: Option<String>,
        created_at: DateTime<Utc>,
        #[serde(default)]
        is_read: bool,
        #[serde(default)]
        request: Option<RequestId>,
        #[serde(default, alias = "user")]
        recipient: Option<UserId>,
    },
}

fn kind_of(tag: Option<String>) -> NotificationKind {
    tag.map(NotificationKind::from)
        .unwrap_or_else(|| NotificationKind::Other("info".to_string()))
}

/// Parse a raw push payload into an event addressed to `owner` unless the
/// payload names a recipient.
pub fn parse_push(raw: &str, owner: &UserId) -> AppResult<NotificationEvent> {
    if raw.len() > MAX_PAYLOAD_SIZE {
        return Err(AppError::malformed_payload(format!(
            "Push payload exceeds maximum size of {MAX_PAYLOAD_SIZE} bytes"
        )));
    }
    if raw.trim().is_empty() {
        return Err(AppError::malformed_payload("Empty push payload"));
    }

    let wire: WirePush = serde_json::from_str(raw)
        .map_err(|e| AppError::malformed_payload(format!("Unrecognized push payload: {e}")))?;

    let event = match wire {
        WirePush::Nested {
            message,
            notification_type,
            data,
        } => NotificationEvent {
            id: data.notification_id,
            message,
            kind: kind_of(notification_type),
            read: false,
            created_at: data.created_at,
            recipient_id: data.recipient.unwrap_or_else(|| owner.clone()),
            request_id: data.request_id,
        },
        WirePush::Flat {
            id,
            message,
            notification_type,
            created_at,
            is_read,
            request,
            recipient,
        } => NotificationEvent {
            id,
            message,
            kind: kind_of(notification_type),
            read: is_read,
            created_at,
            recipient_id: recipient.unwrap_or_else(|| owner.clone()),
            request_id: request,
        },
    };
    Ok(event)
}
