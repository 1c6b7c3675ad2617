//! Request lifecycle events.

use serde::{Deserialize, Serialize};

use crate::types::id::{RequestId, UserId};

/// Fields shared by every request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRef {
    /// The request that changed.
    pub request_id: RequestId,
    /// The requester, i.e. the event's recipient.
    pub owner: UserId,
    /// Display name of the requested item.
    pub item_name: String,
    /// Requested (or approved) quantity.
    pub quantity: u32,
}

/// Events related to the request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestEvent {
    /// A request was created in `pending`.
    Submitted(RequestRef),
    /// A new-item request was approved.
    Approved(RequestRef),
    /// A new-item request was denied.
    Denied {
        /// The request.
        #[serde(flatten)]
        request: RequestRef,
        /// The reason given by the admin.
        reason: String,
    },
    /// Stock was issued to the requester.
    Issued(RequestRef),
    /// An issued request was closed out for reporting.
    Completed(RequestRef),
    /// Repair work started.
    RepairInProcess(RequestRef),
    /// Repair work finished.
    Repaired(RequestRef),
    /// The item was written off as damaged.
    Damaged(RequestRef),
}

impl RequestEvent {
    /// The request this event is about.
    pub fn request(&self) -> &RequestRef {
        match self {
            Self::Submitted(r)
            | Self::Approved(r)
            | Self::Issued(r)
            | Self::Completed(r)
            | Self::RepairInProcess(r)
            | Self::Repaired(r)
            | Self::Damaged(r) => r,
            Self::Denied { request, .. } => request,
        }
    }

    /// Notification kind the backend tags the matching push event with.
    pub fn notification_type(&self) -> &'static str {
        match self {
            Self::Submitted(_) => "request_submitted",
            Self::Approved(_) => "request_approved",
            Self::Denied { .. } => "request_denied",
            Self::Issued(_) => "item_issued",
            Self::Completed(_) => "request_completed",
            Self::RepairInProcess(_) => "repair_in_process",
            Self::Repaired(_) => "repair_completed",
            Self::Damaged(_) => "item_damaged",
        }
    }

    /// Owner-facing summary of the new status.
    pub fn summary(&self) -> String {
        let r = self.request();
        let subject = format!("Your request for {} ({})", r.item_name, r.quantity);
        match self {
            Self::Submitted(_) => format!("{subject} has been submitted"),
            Self::Approved(_) => format!("{subject} has been approved"),
            Self::Denied { reason, .. } => format!("{subject} has been denied: {reason}"),
            Self::Issued(_) => format!("{subject} has been issued"),
            Self::Completed(_) => format!("{subject} has been completed"),
            Self::RepairInProcess(_) => format!("{subject} is being repaired"),
            Self::Repaired(_) => format!("{subject} has been repaired"),
            Self::Damaged(_) => format!("{subject} was marked as damaged"),
        }
    }
}
