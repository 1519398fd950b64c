//! Timeout configuration for requests and push connections

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::validation::{ConfigResult, ConfigValidator};

/// Runtime timeout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Time allowed for response headers of a single HTTP request
    pub request_timeout: Duration,
    /// TCP connect timeout for HTTP requests
    pub connect_timeout: Duration,
    /// Time allowed for a push connection handshake
    pub push_connect_timeout: Duration,
    /// Time allowed for a push connection to finish a caller-initiated close
    pub close_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            push_connect_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(2),
        }
    }
}

impl TimeoutConfig {
    /// Validate timeout configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any timeout is zero or longer than an hour.
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_timeout(self.request_timeout, "request_timeout")?;
        ConfigValidator::validate_timeout(self.connect_timeout, "connect_timeout")?;
        ConfigValidator::validate_timeout(self.push_connect_timeout, "push_connect_timeout")?;
        ConfigValidator::validate_timeout(self.close_timeout, "close_timeout")?;
        Ok(())
    }
}
