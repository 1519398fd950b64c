//! Reconnect policy for push connections with exponential backoff
//!
//! The delay before reconnect attempt `n` (counted from zero) is
//! `base_delay_ms × growth_factor^n`, capped at `max_delay_ms`, with optional
//! symmetric jitter. HTTP requests are never retried by this crate; the
//! policy only drives push connection recovery.

use std::time::Duration;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// Reconnect policy configuration - all durations in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Maximum number of reconnect attempts before the connection fails for good
    pub max_attempts: u32,
    /// Delay in milliseconds before the first reconnect attempt
    pub base_delay_ms: u64,
    /// Backoff multiplier applied per attempt
    pub growth_factor: f64,
    /// Upper bound in milliseconds for any single delay
    pub max_delay_ms: u64,
    /// Jitter factor (0.0 to 1.0); zero keeps the sequence exact
    #[serde(default)]
    pub jitter_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000, // 1 second
            growth_factor: 2.0,
            max_delay_ms: 60_000, // 1 minute
            jitter_factor: 0.0,
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, growth_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay_ms: u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX),
            growth_factor,
            ..Self::default()
        }
    }

    /// Never reconnect; the first loss moves the connection to `Failed`.
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay_ms = u64::try_from(max_delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    /// Delay to wait before reconnect attempt `attempt` (zero-based).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = (self.base_delay_ms as f64) * self.growth_factor.powi(exponent);
        let capped = if raw.is_finite() {
            raw.min(self.max_delay_ms as f64)
        } else {
            self.max_delay_ms as f64
        };

        if self.jitter_factor <= 0.0 {
            return Duration::from_millis(capped as u64);
        }

        let jitter_range = capped * self.jitter_factor;
        let jitter = Rng::new().f64() * jitter_range - (jitter_range / 2.0);
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }

    /// Whether another reconnect may be scheduled after `attempt` reconnects.
    #[inline]
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Validate policy configuration for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.growth_factor < 1.0 || !self.growth_factor.is_finite() {
            return Err("growth_factor must be a finite value of at least 1.0".to_string());
        }

        if self.jitter_factor < 0.0 || self.jitter_factor > 1.0 {
            return Err("jitter_factor must be between 0.0 and 1.0".to_string());
        }

        if self.base_delay_ms > self.max_delay_ms {
            return Err("base_delay_ms cannot exceed max_delay_ms".to_string());
        }

        Ok(())
    }
}
