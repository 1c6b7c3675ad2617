//! Request CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use quartermaster_core::AppError;
use quartermaster_core::types::id::{IssuedItemId, ItemId, RequestId, UserId};
use quartermaster_entity::request::{NewRequest, Request, RequestPriority, RequestStatus, RequestType};
use quartermaster_service::RequestCache;

/// Arguments for request commands
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Request subcommand
    #[command(subcommand)]
    pub command: RequestCommand,
}

/// Request subcommands
#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// List requests
    List {
        /// Request type: new or repair
        #[arg(short = 't', long = "type", default_value = "new")]
        kind: String,
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
        /// Only requests made by the current user
        #[arg(long)]
        mine: bool,
    },
    /// Submit a new-item or repair request
    Submit {
        /// Stock item id
        item: String,
        /// Quantity
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Request type: new or repair
        #[arg(short = 't', long = "type", default_value = "new")]
        kind: String,
        /// Priority: normal, high or urgent
        #[arg(short, long, default_value = "normal")]
        priority: String,
        /// Purpose of the request
        #[arg(long)]
        purpose: Option<String>,
        /// Fault description (repair requests)
        #[arg(short, long)]
        description: Option<String>,
        /// Issued-item record being repaired
        #[arg(long)]
        issued_item: Option<String>,
    },
    /// Approve a pending new-item request
    Approve {
        /// Request id
        id: String,
        /// Approve a different quantity than requested
        #[arg(short, long)]
        quantity: Option<u32>,
    },
    /// Deny a pending new-item request
    Deny {
        /// Request id
        id: String,
        /// Reason shown to the requester
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Issue an approved request's stock
    Issue {
        /// Request id
        id: String,
    },
    /// Close out an issued request
    Complete {
        /// Request id
        id: String,
    },
    /// Start work on a repair request
    InProcess {
        /// Repair request id
        id: String,
    },
    /// Finish work on a repair request
    Repaired {
        /// Repair request id
        id: String,
    },
    /// Write off the item of a repair request
    Damaged {
        /// Repair request id
        id: String,
        /// What is wrong with the item
        #[arg(short, long)]
        description: Option<String>,
    },
}

/// Request display row for table output
#[derive(Debug, Serialize, Tabled)]
struct RequestRow {
    /// Request ID
    id: String,
    /// Type
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    kind: String,
    /// Item
    item: String,
    /// Quantity
    quantity: u32,
    /// Requester
    requested_by: String,
    /// Status
    status: String,
    /// Priority
    priority: String,
    /// Requested at
    requested_at: String,
}

impl From<&Request> for RequestRow {
    fn from(r: &Request) -> Self {
        Self {
            id: r.id.to_string(),
            kind: r.request_type.to_string(),
            item: r.item_label(),
            quantity: r.quantity,
            requested_by: r
                .requested_by_name
                .clone()
                .unwrap_or_else(|| r.requested_by.to_string()),
            status: r.status.to_string(),
            priority: r.priority.to_string(),
            requested_at: r.requested_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute request commands
pub async fn execute(
    args: &RequestArgs,
    config_path: &str,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let session = super::connect(config_path, env)?;
    let ctx = &session.context;
    let lifecycle = &session.lifecycle;

    let updated = match &args.command {
        RequestCommand::List { kind, status, mine } => {
            let request_type: RequestType = kind.parse()?;
            let status = status
                .as_deref()
                .map(str::parse::<RequestStatus>)
                .transpose()?;
            lifecycle.refresh(ctx, request_type).await?;

            let requester = mine.then_some(&ctx.user_id);
            let rows: Vec<RequestRow> = listed(&session.requests, request_type, status, requester)
                .iter()
                .map(RequestRow::from)
                .collect();
            output::print_list(&rows, format);
            return Ok(());
        }
        RequestCommand::Submit {
            item,
            quantity,
            kind,
            priority,
            purpose,
            description,
            issued_item,
        } => {
            let request = NewRequest {
                request_type: kind.parse()?,
                item: item.parse::<ItemId>()?,
                quantity: *quantity,
                priority: priority.parse::<RequestPriority>()?,
                purpose: purpose.clone(),
                description: description.clone(),
                issued_item: issued_item
                    .as_deref()
                    .map(str::parse::<IssuedItemId>)
                    .transpose()?,
            };
            lifecycle.submit(ctx, request).await?
        }
        RequestCommand::Approve { id, quantity } => {
            lifecycle.approve(ctx, &parse_id(id)?, *quantity).await?
        }
        RequestCommand::Deny { id, reason } => {
            let reason = match reason {
                Some(r) => r.clone(),
                None => prompt("Reason for denial")?,
            };
            lifecycle.deny(ctx, &parse_id(id)?, &reason).await?
        }
        RequestCommand::Issue { id } => lifecycle.issue(ctx, &parse_id(id)?).await?,
        RequestCommand::Complete { id } => lifecycle.complete(ctx, &parse_id(id)?).await?,
        RequestCommand::InProcess { id } => lifecycle.mark_in_process(ctx, &parse_id(id)?).await?,
        RequestCommand::Repaired { id } => lifecycle.mark_repaired(ctx, &parse_id(id)?).await?,
        RequestCommand::Damaged { id, description } => {
            let description = match description {
                Some(d) => d.clone(),
                None => prompt("Damage description")?,
            };
            lifecycle
                .mark_damaged(ctx, &parse_id(id)?, &description)
                .await?
        }
    };

    match format {
        OutputFormat::Table => {
            output::print_success(&updated.event().summary());
            output::print_kv("Request", updated.id.as_str());
            output::print_kv("Status", updated.status.as_str());
        }
        OutputFormat::Json => output::print_item(&updated, format),
    }
    Ok(())
}

fn parse_id(id: &str) -> Result<RequestId, AppError> {
    id.parse()
}

fn prompt(label: &str) -> Result<String, AppError> {
    dialoguer::Input::new()
        .with_prompt(label)
        .interact_text()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Cached requests of one type, optionally narrowed to a status and a requester. Newest first.
fn listed(
    cache: &RequestCache,
    request_type: RequestType,
    status: Option<RequestStatus>,
    requester: Option<&UserId>,
) -> Vec<Request> {
    let candidates = match (status, requester) {
        (Some(status), _) => cache.by_status(status),
        (None, Some(user)) => cache.requested_by(user),
        (None, None) => cache.by_type(request_type),
    };
    candidates
        .into_iter()
        .filter(|r| r.request_type == request_type)
        .filter(|r| requester.is_none_or(|user| &r.requested_by == user))
        .collect()
}
