//! CLI command definitions and dispatch.

pub mod config;
pub mod notification;
pub mod request;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use quartermaster_core::AppError;
use quartermaster_core::config::AppConfig;
use quartermaster_service::ClientSession;

/// Quartermaster: logistics requests and notifications from the terminal
#[derive(Debug, Parser)]
#[command(name = "quartermaster", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from config/<env>
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// New-item and repair requests
    Requests(request::RequestArgs),
    /// Notification inbox
    Notifications(notification::NotificationArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Requests(args) => {
                request::execute(args, &self.config, &self.env, self.format).await
            }
            Commands::Notifications(args) => {
                notification::execute(args, &self.config, &self.env, self.format).await
            }
            Commands::Config(args) => config::execute(args, &self.config, &self.env, self.format),
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(config_path: &str, env: &str) -> Result<AppConfig, AppError> {
    tracing::debug!(config_path, env, "Loading configuration");
    AppConfig::load(config_path, env)
}

/// Helper: open a session against the configured backend
pub fn connect(config_path: &str, env: &str) -> Result<ClientSession, AppError> {
    let config = load_config(config_path, env)?;
    ClientSession::connect(&config)
}
