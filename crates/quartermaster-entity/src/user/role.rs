//! User role and permission enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use quartermaster_core::AppError;

/// Roles known to the logistics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    /// Approves and denies requests.
    Admin,
    /// Manages users, stock and audit logs.
    SystemAdmin,
    /// Requests items and repairs for a unit.
    UnitLeader,
    /// Manages stock, issues items and handles repairs.
    LogisticsOfficer,
}

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Submit new-item requests.
    RequestItems,
    /// Submit repair requests.
    RequestRepairs,
    /// Approve or deny new-item requests.
    ApproveRequests,
    /// Issue approved stock.
    IssueItems,
    /// Move repair requests through in-process, repaired and damaged.
    ManageRepairs,
    /// Add, edit and remove stock.
    ManageStock,
    /// Manage user accounts.
    ManageUsers,
    /// View reports.
    ViewReports,
    /// View audit logs.
    ViewLogs,
}

impl UserRole {
    /// Permissions granted to this role.
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Self::Admin => &[RequestItems, RequestRepairs, ApproveRequests, ViewReports],
            Self::SystemAdmin => &[ManageStock, ManageUsers, ViewReports, ViewLogs],
            Self::UnitLeader => &[RequestItems, RequestRepairs],
            Self::LogisticsOfficer => &[ManageStock, IssueItems, ManageRepairs, ViewReports],
        }
    }

    /// Check whether this role holds `permission`.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Fail with an authorization error unless this role holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{self}' does not have permission '{permission:?}'"
            )))
        }
    }

    /// Return the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SystemAdmin => "system-admin",
            Self::UnitLeader => "unit-leader",
            Self::LogisticsOfficer => "logistics-officer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "admin" => Ok(Self::Admin),
            "system-admin" => Ok(Self::SystemAdmin),
            "unit-leader" => Ok(Self::UnitLeader),
            "logistics-officer" => Ok(Self::LogisticsOfficer),
            _ => Err(AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, system-admin, unit-leader, logistics-officer"
            ))),
        }
    }
}
