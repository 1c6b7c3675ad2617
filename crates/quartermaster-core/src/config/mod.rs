//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `QUARTERMASTER__*` environment variables. Each sub-module
//! represents a logical configuration section.

pub mod api;
pub mod auth;
pub mod logging;
pub mod realtime;

use serde::{Deserialize, Serialize};

use self::api::ApiConfig;
use self::auth::AuthConfig;
use self::logging::LoggingConfig;
use self::realtime::RealtimeConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST backend settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Live notification channel settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Session credentials.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges the file at `path` (extension optional), an environment overlay
    /// `config/{env}`, and environment variables prefixed with
    /// `QUARTERMASTER__`. Missing files are skipped.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUARTERMASTER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api.timeout_seconds == 0 {
            return Err(AppError::configuration("api.timeout_seconds must be > 0"));
        }
        if self.realtime.max_attempts == 0 {
            return Err(AppError::configuration("realtime.max_attempts must be > 0"));
        }
        if self.realtime.connect_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "realtime.connect_timeout_seconds must be > 0",
            ));
        }
        if self.realtime.base_delay_ms > self.realtime.max_delay_ms {
            return Err(AppError::configuration(format!(
                "realtime.base_delay_ms ({}) exceeds realtime.max_delay_ms ({})",
                self.realtime.base_delay_ms, self.realtime.max_delay_ms
            )));
        }
        Ok(())
    }
}
