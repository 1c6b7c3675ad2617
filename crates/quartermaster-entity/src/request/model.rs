//! Request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use quartermaster_core::AppError;
use quartermaster_core::events::request::{RequestEvent, RequestRef};
use quartermaster_core::types::id::{IssuedItemId, ItemId, RequestId, UserId};

use super::status::{RequestPriority, RequestStatus, RequestType};

/// A new-item or repair request as held by the backend.
///
/// Requests are never deleted; they only move through the transitions in
/// [`super::transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique request identifier.
    pub id: RequestId,
    /// New-item or repair.
    #[serde(rename = "type")]
    pub request_type: RequestType,
    /// The stock item the request refers to.
    pub item: ItemId,
    /// Display name of the item, when the backend includes it.
    #[serde(default)]
    pub item_name: Option<String>,
    /// Requested quantity; replaced by the approved quantity on approval.
    pub quantity: u32,
    /// The requester.
    pub requested_by: UserId,
    /// Display name of the requester.
    #[serde(default)]
    pub requested_by_name: Option<String>,
    /// When the request was created.
    #[serde(alias = "created_at")]
    pub requested_at: DateTime<Utc>,
    /// Current status.
    pub status: RequestStatus,
    /// Urgency.
    #[serde(default)]
    pub priority: RequestPriority,
    /// Free-text purpose.
    #[serde(default)]
    pub purpose: Option<String>,
    /// Fault description of a repair request.
    #[serde(default)]
    pub description: Option<String>,
    /// The issued-item record a repair request refers to.
    #[serde(default)]
    pub issued_item: Option<IssuedItemId>,
    /// Admin who approved.
    #[serde(default)]
    pub approved_by: Option<UserId>,
    /// When it was approved.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    /// Admin who denied.
    #[serde(default)]
    pub denied_by: Option<UserId>,
    /// When it was denied.
    #[serde(default)]
    pub denied_at: Option<DateTime<Utc>>,
    /// Denial reason or damage description.
    #[serde(default)]
    pub reason: Option<String>,
    /// Logistics officer who issued.
    #[serde(default)]
    pub issued_by: Option<UserId>,
    /// When it was issued.
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    /// Actor of the latest transition.
    #[serde(default)]
    pub updated_by: Option<UserId>,
    /// Time of the latest transition.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Request {
    /// Display label for the item, falling back to its id.
    pub fn item_label(&self) -> String {
        self.item_name
            .clone()
            .unwrap_or_else(|| format!("item #{}", self.item))
    }

    /// The owner-facing event for the request's current status.
    pub fn event(&self) -> RequestEvent {
        let request = RequestRef {
            request_id: self.id.clone(),
            owner: self.requested_by.clone(),
            item_name: self.item_label(),
            quantity: self.quantity,
        };
        match self.status {
            RequestStatus::Pending => RequestEvent::Submitted(request),
            RequestStatus::Approved => RequestEvent::Approved(request),
            RequestStatus::Denied => RequestEvent::Denied {
                request,
                reason: self.reason.clone().unwrap_or_default(),
            },
            RequestStatus::Issued => RequestEvent::Issued(request),
            RequestStatus::Completed => RequestEvent::Completed(request),
            RequestStatus::RepairInProcess => RequestEvent::RepairInProcess(request),
            RequestStatus::Repaired => RequestEvent::Repaired(request),
            RequestStatus::Damaged => RequestEvent::Damaged(request),
        }
    }
}

/// Data required to submit a request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_repair_description"))]
pub struct NewRequest {
    /// New-item or repair.
    #[serde(rename = "type")]
    pub request_type: RequestType,
    /// The stock item.
    pub item: ItemId,
    /// Requested quantity.
    #[validate(range(min = 1))]
    pub quantity: u32,
    /// Urgency.
    #[serde(default)]
    pub priority: RequestPriority,
    /// Free-text purpose.
    #[validate(length(max = 500))]
    pub purpose: Option<String>,
    /// Fault description; required for repair requests.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// The issued-item record being repaired.
    pub issued_item: Option<IssuedItemId>,
}

impl NewRequest {
    /// Run field validation and map failures to a validation error.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
    }
}

fn validate_repair_description(request: &NewRequest) -> Result<(), ValidationError> {
    let described = request
        .description
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if request.request_type == RequestType::Repair && !described {
        return Err(ValidationError::new("repair_description_required"));
    }
    Ok(())
}
