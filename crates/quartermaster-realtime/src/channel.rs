//! The live notification channel.
//!
//! [`LiveChannel::start`] spawns one driver task that walks the
//! [`ConnectionMachine`]: connect, pump frames into the notification store,
//! back off after a failure, give up after the attempt budget.
//! [`LiveChannel::stop`] cancels the task, which drops any open socket and
//! any pending reconnect delay with it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use reqwest::Url;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use quartermaster_core::config::realtime::RealtimeConfig;
use quartermaster_core::types::id::UserId;
use quartermaster_core::{AppError, AppResult, ErrorKind};
use quartermaster_entity::notification::NotificationEvent;
use quartermaster_service::context::SessionContext;
use quartermaster_service::notification::NotificationStore;

use crate::connection::backoff::BackoffPolicy;
use crate::connection::connector::{Connector, Frame, FrameStream, TungsteniteConnector};
use crate::connection::state::{ConnectionMachine, ConnectionState, DisconnectReason};
use crate::message::parse_push;
use crate::notification::alert::{AlertSink, TracingAlertSink};

/// Handle to the spawned driver.
struct Runner {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Keeps a push connection alive for one session and feeds new events into
/// the session's [`NotificationStore`].
pub struct LiveChannel {
    /// Push endpoint without credentials.
    endpoint: Url,
    /// Reconnect policy.
    policy: BackoffPolicy,
    /// Handshake deadline.
    connect_timeout: Duration,
    /// Opens connections.
    connector: Arc<dyn Connector>,
    /// Deduplicating event list.
    store: Arc<NotificationStore>,
    /// User-visible alert on each new event.
    alerts: Arc<dyn AlertSink>,
    /// Fan-out of new events.
    events: broadcast::Sender<NotificationEvent>,
    /// Current connection state.
    state: Arc<watch::Sender<ConnectionState>>,
    /// Driver of the current run, if any.
    runner: Mutex<Option<Runner>>,
}

impl std::fmt::Debug for LiveChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChannel")
            .field("endpoint", &self.endpoint.as_str())
            .field("policy", &self.policy)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl LiveChannel {
    /// Creates a channel from configuration and its collaborators.
    pub fn new(
        config: &RealtimeConfig,
        connector: Arc<dyn Connector>,
        store: Arc<NotificationStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> AppResult<Self> {
        let endpoint = Url::parse(&config.url).map_err(|e| {
            AppError::configuration(format!("Invalid realtime.url '{}': {e}", config.url))
        })?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(AppError::configuration(format!(
                "realtime.url must use ws:// or wss://, got '{}'",
                endpoint.scheme()
            )));
        }

        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected {
            reason: DisconnectReason::Idle,
        });

        Ok(Self {
            endpoint,
            policy: BackoffPolicy::from_config(config),
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            connector,
            store,
            alerts,
            events,
            state: Arc::new(state),
            runner: Mutex::new(None),
        })
    }

    /// Creates a channel over WebSocket that alerts through `tracing`.
    pub fn with_defaults(config: &RealtimeConfig, store: Arc<NotificationStore>) -> AppResult<Self> {
        Self::new(
            config,
            Arc::new(TungsteniteConnector),
            store,
            Arc::new(TracingAlertSink),
        )
    }

    /// Begin connecting for `ctx`.
    ///
    /// Fails with `AuthRequired`, without attempting a connection, when the
    /// context has no token. Does nothing while a previous run is still
    /// active. Once the state reads `Disconnected`, a new run is started even
    /// if the previous task has not exited yet. Must be called from within a
    /// Tokio runtime.
    pub fn start(&self, ctx: &SessionContext) -> AppResult<()> {
        ctx.ensure_authenticated()?;

        let mut runner = self.runner.lock().unwrap_or_else(|e| e.into_inner());
        let running = runner.as_ref().is_some_and(|r| !r.task.is_finished());
        if running && self.state().is_active() {
            debug!("Live channel already running");
            return Ok(());
        }
        // A driver that already published its final state may still be
        // unwinding; it must not publish again once the new run starts.
        if let Some(previous) = runner.take() {
            previous.cancel.cancel();
            previous.task.abort();
        }

        let mut machine = ConnectionMachine::new(self.policy);
        if let Some(state) = machine.start() {
            self.state.send_replace(state);
        }

        let mut endpoint = self.endpoint.clone();
        endpoint.query_pairs_mut().append_pair("token", &ctx.token);

        let cancel = CancellationToken::new();
        let driver = Driver {
            endpoint,
            owner: ctx.user_id.clone(),
            connect_timeout: self.connect_timeout,
            machine,
            connector: Arc::clone(&self.connector),
            store: Arc::clone(&self.store),
            alerts: Arc::clone(&self.alerts),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(driver.run());
        *runner = Some(Runner { cancel, task });

        info!(
            user_id = %ctx.user_id,
            endpoint = %self.endpoint,
            max_attempts = self.policy.max_attempts,
            "Live channel started"
        );
        Ok(())
    }

    /// Close any open connection and cancel any pending reconnect.
    ///
    /// Returns once the driver task has finished. Idempotent.
    pub async fn stop(&self) {
        let runner = self.runner.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(runner) = runner else {
            return;
        };

        runner.cancel.cancel();
        if let Err(e) = runner.task.await {
            if e.is_panic() {
                error!(error = %e, "Live channel driver panicked");
                self.state.send_replace(ConnectionState::Disconnected {
                    reason: DisconnectReason::Stopped,
                });
            }
        }
        info!(state = %self.state(), "Live channel stopped");
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Receive every newly observed event.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// The store events are delivered into.
    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        let runner = self.runner.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(runner) = runner.take() {
            runner.cancel.cancel();
        }
    }
}

/// How a live connection ended.
enum Closed {
    /// The owner stopped the channel.
    Cancelled,
    /// The connection dropped.
    Lost(String),
}

/// State owned by the spawned task.
struct Driver {
    endpoint: Url,
    owner: UserId,
    connect_timeout: Duration,
    machine: ConnectionMachine,
    connector: Arc<dyn Connector>,
    store: Arc<NotificationStore>,
    alerts: Arc<dyn AlertSink>,
    events: broadcast::Sender<NotificationEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(mut self) {
        loop {
            let running = match self.machine.state() {
                ConnectionState::Connecting { attempt } => self.attempt(attempt).await,
                ConnectionState::Backoff { failures, delay } => self.wait(failures, delay).await,
                ConnectionState::Connected => {
                    // attempt() only returns after the connection ended
                    self.machine.on_failure();
                    self.publish();
                    true
                }
                ConnectionState::Disconnected { reason } => {
                    match reason {
                        DisconnectReason::Exhausted => error!(
                            max_attempts = self.machine.policy().max_attempts,
                            "Live channel gave up reconnecting; live updates are off until it is restarted"
                        ),
                        DisconnectReason::AuthRejected => {
                            warn!("Live channel stopped: session rejected by the push endpoint")
                        }
                        DisconnectReason::Idle | DisconnectReason::Stopped => {}
                    }
                    return;
                }
            };

            if !running {
                self.machine.on_stop();
                self.publish();
                return;
            }
        }
    }

    /// One connection attempt, and the session that follows if it opens.
    /// Returns `false` if cancelled.
    async fn attempt(&mut self, attempt: u32) -> bool {
        debug!(attempt, "Connecting live channel");
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => return false,
            outcome = tokio::time::timeout(
                self.connect_timeout,
                self.connector.connect(&self.endpoint),
            ) => outcome,
        };

        match outcome {
            Ok(Ok(frames)) => {
                self.machine.on_open();
                self.publish();
                info!(attempt, "Live channel connected");
                match self.pump(frames).await {
                    Closed::Cancelled => return false,
                    Closed::Lost(reason) => warn!(%reason, "Live channel connection lost"),
                }
                self.machine.on_failure();
            }
            Ok(Err(e)) if e.kind == ErrorKind::AuthRequired => {
                warn!(attempt, error = %e.message, "Live channel session rejected");
                self.machine.on_auth_rejected();
            }
            Ok(Err(e)) => {
                warn!(attempt, error = %e, "Live channel connection attempt failed");
                self.machine.on_failure();
            }
            Err(_) => {
                warn!(
                    attempt,
                    timeout_secs = self.connect_timeout.as_secs(),
                    "Live channel handshake timed out"
                );
                self.machine.on_failure();
            }
        }
        self.publish();
        true
    }

    /// Sleep out a backoff delay. Returns `false` if cancelled.
    async fn wait(&mut self, failures: u32, delay: Duration) -> bool {
        info!(
            failures,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting live channel after delay"
        );
        tokio::select! {
            _ = self.cancel.cancelled() => return false,
            _ = tokio::time::sleep(delay) => {}
        }
        self.machine.on_backoff_elapsed();
        self.publish();
        true
    }

    /// Deliver frames in arrival order until the connection ends.
    async fn pump(&self, mut frames: FrameStream) -> Closed {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Closed::Cancelled,
                frame = frames.next() => match frame {
                    Some(Ok(Frame::Text(payload))) => self.deliver(&payload),
                    Some(Ok(Frame::Close { code, reason })) => {
                        return Closed::Lost(format!("closed by server (code {code:?}) {reason}"));
                    }
                    Some(Err(e)) => return Closed::Lost(e.to_string()),
                    None => return Closed::Lost("stream ended".to_string()),
                },
            }
        }
    }

    fn deliver(&self, payload: &str) {
        match parse_push(payload, &self.owner) {
            Ok(event) => {
                if self.store.insert(event.clone()) {
                    debug!(notification_id = %event.id, kind = %event.kind, "New notification");
                    self.alerts.alert(&event);
                    let _ = self.events.send(event);
                } else {
                    debug!(notification_id = %event.id, "Duplicate notification dropped");
                }
            }
            Err(e) => warn!(
                error = %e.message,
                len = payload.len(),
                "Dropping malformed push payload"
            ),
        }
    }

    fn publish(&self) {
        let state = self.machine.state();
        debug!(%state, "Live channel state");
        self.state.send_replace(state);
    }
}
