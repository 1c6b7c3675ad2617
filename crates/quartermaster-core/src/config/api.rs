//! REST backend configuration.

use serde::{Deserialize, Serialize};

/// Settings for the request/response transport to the logistics backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL that resource paths such as `requests/` are joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api/".to_string()
}

fn default_timeout() -> u64 {
    30
}
