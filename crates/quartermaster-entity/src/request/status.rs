//! Request type, status and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use quartermaster_core::AppError;

/// Kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// Request for new stock.
    New,
    /// Request to repair an issued item.
    Repair,
}

impl RequestType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Repair => "repair",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "repair" => Ok(Self::Repair),
            _ => Err(AppError::validation(format!(
                "Invalid request type: '{s}'. Expected one of: new, repair"
            ))),
        }
    }
}

/// Status of a request.
///
/// New-item requests use `pending`, `approved`, `denied`, `issued` and
/// `completed`; repair requests use `pending`, `repair-in-process`,
/// `repaired` and `damaged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    /// Waiting for a decision.
    Pending,
    /// Approved, waiting to be issued.
    Approved,
    /// Denied with a reason.
    Denied,
    /// Stock handed to the requester.
    Issued,
    /// Closed out for reporting.
    Completed,
    /// Repair work under way.
    RepairInProcess,
    /// Repair finished.
    Repaired,
    /// Written off as damaged.
    Damaged,
}

impl RequestStatus {
    /// Check if no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Denied | Self::Completed | Self::Repaired | Self::Damaged
        )
    }

    /// Check if the status belongs to the given request type's graph.
    pub fn applies_to(&self, request_type: RequestType) -> bool {
        match self {
            Self::Pending => true,
            Self::Approved | Self::Denied | Self::Issued | Self::Completed => {
                request_type == RequestType::New
            }
            Self::RepairInProcess | Self::Repaired | Self::Damaged => {
                request_type == RequestType::Repair
            }
        }
    }

    /// Return the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
            Self::Issued => "issued",
            Self::Completed => "completed",
            Self::RepairInProcess => "repair-in-process",
            Self::Repaired => "repaired",
            Self::Damaged => "damaged",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            "issued" => Ok(Self::Issued),
            "completed" => Ok(Self::Completed),
            "repair-in-process" => Ok(Self::RepairInProcess),
            "repaired" => Ok(Self::Repaired),
            "damaged" => Ok(Self::Damaged),
            _ => Err(AppError::validation(format!("Invalid request status: '{s}'"))),
        }
    }
}

/// Urgency of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    /// Default priority.
    #[default]
    Normal,
    /// Needed soon.
    High,
    /// Needed now.
    Urgent,
}

impl RequestPriority {
    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for RequestPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestPriority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(AppError::validation(format!(
                "Invalid priority: '{s}'. Expected one of: normal, high, urgent"
            ))),
        }
    }
}
