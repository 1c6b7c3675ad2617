//! Connection state machine.
//!
//! ```text
//! Disconnected --start--> Connecting --open--> Connected
//!      ^                    |    ^                 |
//!      |                failure  elapsed        failure
//!      |                    v    |                 |
//!      +--exhausted----- Backoff <-----------------+
//! ```
//!
//! `stop` leads to `Disconnected` from every state. A rejected session
//! leads to `Disconnected` without retrying.

use std::fmt;
use std::time::Duration;

use super::backoff::BackoffPolicy;

/// Why the channel is not connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Never started.
    Idle,
    /// Stopped by its owner.
    Stopped,
    /// Gave up after the maximum number of attempts.
    Exhausted,
    /// The endpoint refused the session token.
    AuthRejected,
}

/// Observable state of the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no pending attempt.
    Disconnected {
        /// Why.
        reason: DisconnectReason,
    },
    /// Handshake in progress.
    Connecting {
        /// 1-based attempt number since the last successful open.
        attempt: u32,
    },
    /// Receiving events.
    Connected,
    /// Waiting before the next attempt.
    Backoff {
        /// Consecutive failures so far.
        failures: u32,
        /// How long until the next attempt.
        delay: Duration,
    },
}

impl ConnectionState {
    /// Whether events can currently arrive.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether the channel is connected or trying to be.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Disconnected { .. })
    }

    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected { .. } => "disconnected",
            Self::Connecting { .. } => "connecting",
            Self::Connected => "connected",
            Self::Backoff { .. } => "backoff",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { reason } => write!(f, "disconnected ({reason:?})"),
            Self::Connecting { attempt } => write!(f, "connecting (attempt {attempt})"),
            Self::Connected => f.write_str("connected"),
            Self::Backoff { failures, delay } => {
                write!(f, "backoff ({failures} failures, retry in {delay:?})")
            }
        }
    }
}

/// Pure transition logic. Each event returns the new state, or `None` if
/// the event does not apply to the current state and was ignored.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    failures: u32,
    policy: BackoffPolicy,
}

impl ConnectionMachine {
    /// A machine in `Disconnected { Idle }`.
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected {
                reason: DisconnectReason::Idle,
            },
            failures: 0,
            policy,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failures since the last successful open.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The backoff policy in use.
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    fn set(&mut self, state: ConnectionState) -> Option<ConnectionState> {
        self.state = state;
        Some(state)
    }

    /// Begin connecting. Only valid while disconnected; resets the counter.
    pub fn start(&mut self) -> Option<ConnectionState> {
        match self.state {
            ConnectionState::Disconnected { .. } => {
                self.failures = 0;
                self.set(ConnectionState::Connecting { attempt: 1 })
            }
            _ => None,
        }
    }

    /// The handshake succeeded.
    pub fn on_open(&mut self) -> Option<ConnectionState> {
        match self.state {
            ConnectionState::Connecting { .. } => {
                self.failures = 0;
                self.set(ConnectionState::Connected)
            }
            _ => None,
        }
    }

    /// An attempt failed or an open connection closed abnormally.
    pub fn on_failure(&mut self) -> Option<ConnectionState> {
        match self.state {
            ConnectionState::Connecting { .. } | ConnectionState::Connected => {
                self.failures += 1;
                if self.policy.is_exhausted(self.failures) {
                    self.set(ConnectionState::Disconnected {
                        reason: DisconnectReason::Exhausted,
                    })
                } else {
                    let delay = self.policy.delay_for(self.failures);
                    self.set(ConnectionState::Backoff {
                        failures: self.failures,
                        delay,
                    })
                }
            }
            _ => None,
        }
    }

    /// The endpoint refused the session.
    pub fn on_auth_rejected(&mut self) -> Option<ConnectionState> {
        match self.state {
            ConnectionState::Connecting { .. } | ConnectionState::Connected => {
                self.set(ConnectionState::Disconnected {
                    reason: DisconnectReason::AuthRejected,
                })
            }
            _ => None,
        }
    }

    /// The backoff delay is over.
    pub fn on_backoff_elapsed(&mut self) -> Option<ConnectionState> {
        match self.state {
            ConnectionState::Backoff { failures, .. } => self.set(ConnectionState::Connecting {
                attempt: failures + 1,
            }),
            _ => None,
        }
    }

    /// The owner stopped the channel.
    pub fn on_stop(&mut self) -> Option<ConnectionState> {
        match self.state {
            ConnectionState::Disconnected { .. } => None,
            _ => self.set(ConnectionState::Disconnected {
                reason: DisconnectReason::Stopped,
            }),
        }
    }
}
