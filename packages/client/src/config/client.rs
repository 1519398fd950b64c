//! Top-level client configuration

use serde::{Deserialize, Serialize};
use url::Url;

use super::progress::ProgressConfig;
use super::timeouts::TimeoutConfig;
use super::validation::{ConfigResult, ConfigValidator, ConfigurationError};
use crate::retry::ReconnectPolicy;

fn default_user_agent() -> String {
    concat!("pulsewire/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Configuration shared by the request executor, the connection manager and
/// the progress correlator.
///
/// ```rust
/// use std::time::Duration;
/// use pulsewire_client::config::ClientConfig;
/// use pulsewire_client::retry::ReconnectPolicy;
///
/// let config = ClientConfig::new("http://127.0.0.1:8000/")?
///     .with_reconnect(ReconnectPolicy::new(3, Duration::from_millis(500), 2.0));
/// assert_eq!(config.push_url()?.as_str(), "ws://127.0.0.1:8000/");
/// # Ok::<(), pulsewire_client::config::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL that request paths are resolved against
    pub base_url: Url,
    /// Base URL for push endpoints; derived from `base_url` when unset
    #[serde(default)]
    pub push_base_url: Option<Url>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default timeouts and policies.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str) -> ConfigResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigurationError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            base_url: ensure_trailing_slash(base_url),
            push_base_url: None,
            timeouts: TimeoutConfig::default(),
            reconnect: ReconnectPolicy::default(),
            progress: ProgressConfig::default(),
            user_agent: default_user_agent(),
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidUrl` if `push_base_url` does not parse.
    pub fn with_push_base_url(mut self, push_base_url: &str) -> ConfigResult<Self> {
        let url = Url::parse(push_base_url)
            .map_err(|e| ConfigurationError::InvalidUrl(format!("{push_base_url}: {e}")))?;
        self.push_base_url = Some(ensure_trailing_slash(url));
        Ok(self)
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL for push connections: the explicit one, or `base_url` with
    /// `http` mapped to `ws` and `https` to `wss`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidUrl` if the scheme cannot be mapped.
    pub fn push_url(&self) -> ConfigResult<Url> {
        if let Some(url) = &self.push_base_url {
            return Ok(url.clone());
        }
        let mut url = self.base_url.clone();
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(ConfigurationError::InvalidUrl(format!(
                    "cannot derive a push URL from scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme).map_err(|()| {
            ConfigurationError::InvalidUrl(format!("cannot switch {} to {scheme}", self.base_url))
        })?;
        Ok(url)
    }

    /// Validate the whole configuration tree.
    ///
    /// Only plain `http`/`ws` transports are built in, so `https` and `wss`
    /// base URLs are rejected here rather than failing on first use.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` found.
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_scheme(&self.base_url, &["http"], "base_url")?;
        ConfigValidator::validate_scheme(&self.push_url()?, &["ws"], "push_base_url")?;
        self.timeouts.validate()?;
        self.reconnect
            .validate()
            .map_err(ConfigurationError::InvalidReconnect)?;
        self.progress.validate()?;

        if self.user_agent.is_empty() {
            return Err(ConfigurationError::InvalidParameter(
                "user_agent cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Relative joins drop the last path segment unless the base ends in '/'.
fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
