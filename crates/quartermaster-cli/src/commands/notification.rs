//! Notification CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use quartermaster_core::AppError;
use quartermaster_core::types::id::NotificationId;
use quartermaster_entity::notification::NotificationEvent;

/// Arguments for notification commands
#[derive(Debug, Args)]
pub struct NotificationArgs {
    /// Notification subcommand
    #[command(subcommand)]
    pub command: NotificationCommand,
}

/// Notification subcommands
#[derive(Debug, Subcommand)]
pub enum NotificationCommand {
    /// List notifications
    List {
        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
    },
    /// Mark one notification as read
    Read {
        /// Notification id
        id: String,
    },
    /// Mark all notifications as read
    ReadAll,
}

/// Notification display row for table output
#[derive(Debug, Serialize, Tabled)]
struct NotificationRow {
    /// Notification ID
    id: String,
    /// Kind
    kind: String,
    /// Message
    message: String,
    /// Read flag
    read: bool,
    /// Created at
    created_at: String,
}

impl From<&NotificationEvent> for NotificationRow {
    fn from(n: &NotificationEvent) -> Self {
        Self {
            id: n.id.to_string(),
            kind: n.kind.to_string(),
            message: n.message.clone(),
            read: n.read,
            created_at: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute notification commands
pub async fn execute(
    args: &NotificationArgs,
    config_path: &str,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let session = super::connect(config_path, env)?;
    let ctx = &session.context;
    let inbox = &session.inbox;

    match &args.command {
        NotificationCommand::List { unread } => {
            let events = inbox.fetch(ctx).await?;
            let rows: Vec<NotificationRow> = events
                .iter()
                .filter(|n| !*unread || n.is_unread())
                .map(NotificationRow::from)
                .collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                output::print_kv("Unread", &inbox.unread_count().to_string());
            }
        }
        NotificationCommand::Read { id } => {
            let id: NotificationId = id.parse()?;
            inbox.mark_read(ctx, &id).await?;
            output::print_success(&format!("Notification {id} marked as read"));
        }
        NotificationCommand::ReadAll => {
            inbox.fetch(ctx).await?;
            let changed = inbox.mark_all_read(ctx).await?;
            output::print_success(&format!("{changed} notification(s) marked as read"));
        }
    }

    Ok(())
}
