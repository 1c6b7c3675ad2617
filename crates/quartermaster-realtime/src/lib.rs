//! # quartermaster-realtime
//!
//! Live notification channel for Quartermaster. Provides:
//!
//! - A one-way push connection kept alive with bounded exponential backoff
//! - An explicit connection state machine observable through a watch channel
//! - Parsing of push payloads into notification events
//! - Deduplicated hand-off into the session's notification store
//! - User-visible alerts for newly observed events

pub mod channel;
pub mod connection;
pub mod message;
pub mod notification;

pub use channel::LiveChannel;
pub use connection::backoff::BackoffPolicy;
pub use connection::connector::{Connector, Frame, FrameStream, TungsteniteConnector};
pub use connection::state::{ConnectionMachine, ConnectionState, DisconnectReason};
pub use notification::alert::{AlertSink, TracingAlertSink};
pub use reqwest::Url;
