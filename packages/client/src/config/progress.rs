//! Progress polling and status-field configuration
//!
//! The backend owns the field names of its status documents and push
//! messages. [`StatusContract`] lists which keys carry the status, progress
//! and message, and which status values end an operation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::validation::{ConfigResult, ConfigValidator, ConfigurationError};

/// Poll cadence and status contract used by the progress correlator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Fixed interval between status polls
    pub poll_interval: Duration,
    #[serde(default)]
    pub status: StatusContract,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            status: StatusContract::default(),
        }
    }
}

impl ProgressConfig {
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_status_contract(mut self, status: StatusContract) -> Self {
        self.status = status;
        self
    }

    /// # Errors
    ///
    /// Returns an error for a zero poll interval or an empty status key list.
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_timeout(self.poll_interval, "poll_interval")?;
        if self.status.status_keys.is_empty() {
            return Err(ConfigurationError::InvalidParameter(
                "status contract needs at least one status key".to_string(),
            ));
        }
        Ok(())
    }
}

/// Field names and terminal values of the backend's status documents
///
/// Keys are tried in order; the first present key wins. Status values are
/// compared case-insensitively and must match a listed value exactly, so a
/// stage marker such as `retrieval_complete` is not mistaken for completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusContract {
    pub status_keys: Vec<String>,
    pub progress_keys: Vec<String>,
    pub message_keys: Vec<String>,
    pub completed_values: Vec<String>,
    pub failed_values: Vec<String>,
}

impl Default for StatusContract {
    fn default() -> Self {
        Self {
            status_keys: strings(&["status", "type"]),
            progress_keys: strings(&["progress", "progress_percent"]),
            message_keys: strings(&["message", "error"]),
            completed_values: strings(&["completed", "complete", "success"]),
            failed_values: strings(&["failed", "error"]),
        }
    }
}

impl StatusContract {
    #[must_use]
    pub fn is_completed(&self, status: &str) -> bool {
        self.completed_values
            .iter()
            .any(|value| value.eq_ignore_ascii_case(status))
    }

    #[must_use]
    pub fn is_failed(&self, status: &str) -> bool {
        self.failed_values
            .iter()
            .any(|value| value.eq_ignore_ascii_case(status))
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}
