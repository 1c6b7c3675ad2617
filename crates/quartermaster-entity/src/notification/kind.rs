//! Notification kind enumeration.

use serde::{Deserialize, Serialize};

/// Categorical tag of a notification.
///
/// Unknown tags are kept verbatim in [`NotificationKind::Other`] so that a
/// backend adding a new type never makes an event unparseable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    /// A unit leader submitted a request.
    RequestSubmitted,
    /// An admin approved a request.
    RequestApproved,
    /// An admin denied a request.
    RequestDenied,
    /// A logistics officer issued stock.
    ItemIssued,
    /// A repair finished.
    RepairCompleted,
    /// A logistics officer deleted a stock item.
    ItemDeleted,
    /// Any other tag.
    Other(String),
}

impl NotificationKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequestSubmitted => "request_submitted",
            Self::RequestApproved => "request_approved",
            Self::RequestDenied => "request_denied",
            Self::ItemIssued => "item_issued",
            Self::RepairCompleted => "repair_completed",
            Self::ItemDeleted => "item_deleted",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(tag: &str) -> Self {
        match tag {
            "request_submitted" => Self::RequestSubmitted,
            "request_approved" => Self::RequestApproved,
            "request_denied" => Self::RequestDenied,
            "item_issued" => Self::ItemIssued,
            "repair_completed" => Self::RepairCompleted,
            "item_deleted" => Self::ItemDeleted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for NotificationKind {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> String {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
