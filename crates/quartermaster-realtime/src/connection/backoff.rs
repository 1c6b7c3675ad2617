//! Reconnect delay policy.

use std::time::Duration;

use quartermaster_core::config::realtime::RealtimeConfig;

/// Exponential backoff with a ceiling and a bounded number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay unit.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
    /// Consecutive failed attempts after which the channel gives up.
    pub max_attempts: u32,
}

impl BackoffPolicy {
    /// Create a policy.
    pub fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            cap,
            max_attempts,
        }
    }

    /// Build the policy from the realtime configuration section.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.max_attempts,
        )
    }

    /// Delay before the next attempt after `failures` consecutive failures:
    /// `min(base * 2^failures, cap)`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Whether `failures` consecutive failures exhaust the attempt budget.
    pub fn is_exhausted(&self, failures: u32) -> bool {
        failures >= self.max_attempts
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}
