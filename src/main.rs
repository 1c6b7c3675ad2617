//! Quartermaster agent.
//!
//! Logs in with the configured session, loads the notification inbox and
//! keeps the live notification channel running until interrupted or until
//! the backend rejects the session.

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt};

use quartermaster_core::{AppError, ErrorKind};
use quartermaster_core::config::AppConfig;
use quartermaster_realtime::{ConnectionState, DisconnectReason, LiveChannel};
use quartermaster_service::ClientSession;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(kind = %e.kind, "Agent error: {}", e.message);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path = std::env::var("QUARTERMASTER_CONFIG")
        .unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("QUARTERMASTER_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&config_path, &env)
}

/// Initialize tracing subscriber
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main agent run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Quartermaster agent v{}", env!("CARGO_PKG_VERSION"));

    let session = ClientSession::connect(&config)?;

    match session.inbox.fetch(&session.context).await {
        Ok(events) => tracing::info!(
            count = events.len(),
            unread = session.inbox.unread_count(),
            "Inbox loaded"
        ),
        Err(e) if e.kind == ErrorKind::AuthRequired => return Err(e),
        Err(e) => tracing::warn!(error = %e, "Could not load inbox; continuing with live events only"),
    }

    let channel = LiveChannel::with_defaults(&config.realtime, session.notifications.clone())?;
    let mut states = channel.subscribe_state();
    let mut events = channel.subscribe();
    channel.start(&session.context)?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break Ok(());
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = *states.borrow_and_update();
                match state {
                    ConnectionState::Disconnected { reason: DisconnectReason::AuthRejected } => {
                        break Err(AppError::auth_required("The backend rejected the session token"));
                    }
                    ConnectionState::Disconnected { reason: DisconnectReason::Exhausted } => {
                        tracing::warn!("Live updates are off; restart the agent to reconnect");
                    }
                    _ => tracing::debug!(%state, "Channel state changed"),
                }
            }
            received = events.recv() => match received {
                Ok(event) => tracing::info!(
                    notification_id = %event.id,
                    unread = session.notifications.unread_count(),
                    "{}",
                    event.message
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event listener fell behind");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    channel.stop().await;
    session.clear();
    tracing::info!("Quartermaster agent stopped");
    outcome
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
