//! Progress events and their normalization from raw status documents

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::StatusContract;

/// Which channel produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Poll,
    Push,
    /// Records of the response body that started the operation
    Stream,
}

/// Where a status sits relative to the end of the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPhase {
    Active,
    Completed,
    Failed,
}

impl StatusPhase {
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, StatusPhase::Active)
    }
}

/// One normalized progress signal.
///
/// Events are ordered by `sequence`, the arrival order inside one
/// operation. `received_at` is informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub sequence: u64,
    pub source: EventSource,
    pub status: String,
    pub phase: StatusPhase,
    /// Percentage in `[0, 100]`
    pub progress: f64,
    pub message: Option<String>,
    /// The document the event was built from, untouched
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl ProgressEvent {
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

/// Status used when a document carries none of the contract's status keys.
pub const UNKNOWN_STATUS: &str = "unknown";

/// Turns poll responses and push messages into [`ProgressEvent`]s for one
/// operation, carrying the last known progress forward.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    contract: StatusContract,
    next_sequence: u64,
    last_progress: f64,
}

impl EventNormalizer {
    pub fn new(contract: StatusContract) -> Self {
        Self {
            contract,
            next_sequence: 0,
            last_progress: 0.0,
        }
    }

    pub fn normalize(&mut self, source: EventSource, payload: Value) -> ProgressEvent {
        let status = self
            .first_string(&payload, &self.contract.status_keys)
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

        let phase = if self.contract.is_completed(&status) {
            StatusPhase::Completed
        } else if self.contract.is_failed(&status) {
            StatusPhase::Failed
        } else {
            StatusPhase::Active
        };

        let progress = match self.progress_value(&payload) {
            Some(progress) => progress,
            None if phase == StatusPhase::Completed => 100.0,
            None => self.last_progress,
        };
        self.last_progress = progress;

        let message = self.first_string(&payload, &self.contract.message_keys);

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        ProgressEvent {
            sequence,
            source,
            status,
            phase,
            progress,
            message,
            payload,
            received_at: Utc::now(),
        }
    }

    fn first_string(&self, payload: &Value, keys: &[String]) -> Option<String> {
        keys.iter()
            .find_map(|key| payload.get(key).and_then(Value::as_str))
            .map(str::to_owned)
    }

    // Numbers and numeric strings are accepted; NaN counts as missing.
    fn progress_value(&self, payload: &Value) -> Option<f64> {
        self.contract
            .progress_keys
            .iter()
            .find_map(|key| match payload.get(key)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .filter(|p| !p.is_nan())
            .map(|p| p.clamp(0.0, 100.0))
    }
}
