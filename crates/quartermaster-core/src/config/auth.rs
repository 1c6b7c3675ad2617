//! Session credentials supplied to the client.

use serde::{Deserialize, Serialize};

/// Who the client acts as.
///
/// Every field is optional; a missing token or user id means the client is
/// not authenticated and identity-bound operations fail with `AuthRequired`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token issued by the backend at login.
    #[serde(default)]
    pub token: Option<String>,
    /// Backend identifier of the logged-in user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Display name of the logged-in user.
    #[serde(default)]
    pub username: Option<String>,
    /// Role name, e.g. `"admin"` or `"logistics-officer"`.
    #[serde(default)]
    pub role: Option<String>,
}
