//! Configuration validation utilities

use std::time::Duration;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid reconnect policy: {0}")]
    InvalidReconnect(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate timeout duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if:
    /// - The timeout duration is zero
    /// - The timeout duration exceeds 1 hour (3600 seconds)
    pub fn validate_timeout(timeout: Duration, name: &str) -> ConfigResult<()> {
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} cannot be zero"
            )));
        }
        if timeout > Duration::from_secs(3600) {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} must not exceed 1 hour"
            )));
        }
        Ok(())
    }

    /// Validate that a URL uses one of the accepted schemes
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidUrl` if the scheme is not listed
    /// or the URL has no host.
    pub fn validate_scheme(url: &url::Url, accepted: &[&str], name: &str) -> ConfigResult<()> {
        if !accepted.contains(&url.scheme()) {
            return Err(ConfigurationError::InvalidUrl(format!(
                "{name} must use one of {accepted:?}, got '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(ConfigurationError::InvalidUrl(format!("{name} has no host")));
        }
        Ok(())
    }
}
