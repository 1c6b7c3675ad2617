//! Domain events emitted by Quartermaster operations.
//!
//! Every successful request transition produces an event directed at the
//! request's owner. The backend persists the transition and pushes the
//! matching notification; the client logs the event it expects to see.

pub mod request;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::id::UserId;

pub use request::RequestEvent;

/// Wrapper for domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID, generated locally.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who caused the event.
    pub actor_id: Option<UserId>,
    /// The event payload.
    pub payload: RequestEvent,
}

impl DomainEvent {
    /// Create a new domain event stamped with the current time.
    pub fn new(actor_id: Option<UserId>, payload: RequestEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}
