//! Legal request transitions.
//!
//! New-item requests:
//!
//! ```text
//! pending --approve--> approved --issue--> issued --complete--> completed
//! pending --deny-----> denied
//! ```
//!
//! Repair requests:
//!
//! ```text
//! pending --mark_in_process--> repair-in-process --mark_repaired--> repaired
//! pending --mark_damaged-----> damaged
//! ```
//!
//! Nothing re-enters `pending`. Planning a transition is pure: it either
//! yields the stamped next version of the request or an error, and never
//! touches the input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quartermaster_core::AppError;
use quartermaster_core::types::id::UserId;

use crate::user::Permission;

use super::model::Request;
use super::status::{RequestStatus, RequestType};

/// A requested change of a request's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Transition {
    /// Approve, optionally with a modified quantity.
    Approve {
        /// Approved quantity; `None` keeps the requested one.
        quantity: Option<u32>,
    },
    /// Deny with a reason.
    Deny {
        /// Why the request was denied.
        reason: String,
    },
    /// Hand approved stock to the requester.
    Issue,
    /// Close out an issued request.
    Complete,
    /// Start repair work.
    MarkInProcess,
    /// Finish repair work.
    MarkRepaired,
    /// Write the item off as damaged.
    MarkDamaged {
        /// What is wrong with the item.
        description: String,
    },
}

impl Transition {
    /// Short action name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Deny { .. } => "deny",
            Self::Issue => "issue",
            Self::Complete => "complete",
            Self::MarkInProcess => "mark_in_process",
            Self::MarkRepaired => "mark_repaired",
            Self::MarkDamaged { .. } => "mark_damaged",
        }
    }

    /// The request type this transition belongs to.
    pub fn request_type(&self) -> RequestType {
        match self {
            Self::Approve { .. } | Self::Deny { .. } | Self::Issue | Self::Complete => {
                RequestType::New
            }
            Self::MarkInProcess | Self::MarkRepaired | Self::MarkDamaged { .. } => {
                RequestType::Repair
            }
        }
    }

    /// The only status this transition may start from.
    pub fn source(&self) -> RequestStatus {
        match self {
            Self::Approve { .. } | Self::Deny { .. } => RequestStatus::Pending,
            Self::Issue => RequestStatus::Approved,
            Self::Complete => RequestStatus::Issued,
            Self::MarkInProcess | Self::MarkDamaged { .. } => RequestStatus::Pending,
            Self::MarkRepaired => RequestStatus::RepairInProcess,
        }
    }

    /// The status this transition leads to.
    pub fn target(&self) -> RequestStatus {
        match self {
            Self::Approve { .. } => RequestStatus::Approved,
            Self::Deny { .. } => RequestStatus::Denied,
            Self::Issue => RequestStatus::Issued,
            Self::Complete => RequestStatus::Completed,
            Self::MarkInProcess => RequestStatus::RepairInProcess,
            Self::MarkRepaired => RequestStatus::Repaired,
            Self::MarkDamaged { .. } => RequestStatus::Damaged,
        }
    }

    /// Permission the acting user must hold.
    pub fn required_permission(&self) -> Permission {
        match self {
            Self::Approve { .. } | Self::Deny { .. } => Permission::ApproveRequests,
            Self::Issue | Self::Complete => Permission::IssueItems,
            Self::MarkInProcess | Self::MarkRepaired | Self::MarkDamaged { .. } => {
                Permission::ManageRepairs
            }
        }
    }

    /// Check that the transition is legal for `request` and its inputs are
    /// well formed.
    pub fn check(&self, request: &Request) -> Result<(), AppError> {
        if request.request_type != self.request_type() || request.status != self.source() {
            return Err(AppError::invalid_transition(format!(
                "cannot {} {} request {} in status '{}'",
                self.name(),
                request.request_type,
                request.id,
                request.status
            )));
        }

        match self {
            Self::Approve { quantity: Some(0) } => {
                Err(AppError::validation("approved quantity must be at least 1"))
            }
            Self::Deny { reason } if reason.trim().is_empty() => {
                Err(AppError::validation("a denial reason is required"))
            }
            Self::MarkDamaged { description } if description.trim().is_empty() => {
                Err(AppError::validation("a damage description is required"))
            }
            _ => Ok(()),
        }
    }

    /// Quantity that stock must cover for this transition on `request`.
    pub fn quantity_for(&self, request: &Request) -> u32 {
        match self {
            Self::Approve {
                quantity: Some(quantity),
            } => *quantity,
            _ => request.quantity,
        }
    }

    /// Produce the next version of `request`, stamped with `actor` and `at`.
    pub fn apply(
        &self,
        request: &Request,
        actor: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Request, AppError> {
        self.check(request)?;

        let mut next = request.clone();
        next.status = self.target();
        next.updated_by = Some(actor.clone());
        next.updated_at = Some(at);

        match self {
            Self::Approve { quantity } => {
                if let Some(quantity) = quantity {
                    next.quantity = *quantity;
                }
                next.approved_by = Some(actor.clone());
                next.approved_at = Some(at);
            }
            Self::Deny { reason } => {
                next.denied_by = Some(actor.clone());
                next.denied_at = Some(at);
                next.reason = Some(reason.trim().to_string());
            }
            Self::Issue => {
                next.issued_by = Some(actor.clone());
                next.issued_at = Some(at);
            }
            Self::MarkDamaged { description } => {
                next.reason = Some(description.trim().to_string());
            }
            Self::Complete | Self::MarkInProcess | Self::MarkRepaired => {}
        }

        Ok(next)
    }
}
