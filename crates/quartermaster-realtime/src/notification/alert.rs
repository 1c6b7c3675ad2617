//! Alerting on new notifications.

use tracing::info;

use quartermaster_entity::notification::NotificationEvent;

/// Receives every newly observed event exactly once.
pub trait AlertSink: Send + Sync {
    /// Show `event` to the user.
    fn alert(&self, event: &NotificationEvent);
}

/// Emits alerts as log records on the `quartermaster::alert` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, event: &NotificationEvent) {
        info!(
            target: "quartermaster::alert",
            notification_id = %event.id,
            kind = %event.kind,
            "{}",
            event.message
        );
    }
}
