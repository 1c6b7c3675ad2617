//! Live notification channel configuration.

use serde::{Deserialize, Serialize};

/// Push-channel connection and reconnect settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// WebSocket endpoint. The session token is appended as `?token=`.
    #[serde(default = "default_url")]
    pub url: String,
    /// Base backoff delay in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Consecutive failed connection attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Handshake timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Capacity of the in-process broadcast of new events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
            connect_timeout_seconds: default_connect_timeout(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_url() -> String {
    "ws://localhost:8000/ws/notifications/".to_string()
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_event_buffer() -> usize {
    64
}
