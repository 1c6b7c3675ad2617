//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use quartermaster_core::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration file
    Validate,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config_path: &str,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path, env)?;
            if config.auth.token.is_some() {
                config.auth.token = Some("****".to_string());
            }
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match super::load_config(config_path, env) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("API", &config.api.base_url);
                output::print_kv("Push endpoint", &config.realtime.url);
                output::print_kv(
                    "Reconnect",
                    &format!(
                        "{} attempts, {}ms base, {}ms cap",
                        config.realtime.max_attempts,
                        config.realtime.base_delay_ms,
                        config.realtime.max_delay_ms
                    ),
                );
                output::print_kv(
                    "Session",
                    if config.auth.token.is_some() {
                        "token configured"
                    } else {
                        "not logged in"
                    },
                );
            }
            Err(e) => {
                return Err(AppError::configuration(format!(
                    "Configuration invalid: {}",
                    e.message
                )));
            }
        },
    }

    Ok(())
}
