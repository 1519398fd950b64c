use serde::Serialize;

use super::event::{ProgressEvent, StatusPhase};

/// How an observed operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A source reported a completed status
    Completed,
    /// A source reported a failed status
    Failed,
    /// The caller cancelled before any terminal status
    Cancelled,
    /// Polling stopped and the push connection gave up reconnecting
    SourcesLost,
}

impl Outcome {
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

/// Ordered progress events for one operation.
///
/// Read-only outside the crate. The first completed or failed event fixes
/// the outcome; later disagreement from the other source is not reconciled.
#[derive(Debug, Clone, Serialize)]
pub struct OperationTimeline {
    operation: String,
    events: Vec<ProgressEvent>,
    outcome: Option<Outcome>,
    high_water: f64,
}

impl OperationTimeline {
    pub(crate) fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            events: Vec::new(),
            outcome: None,
            high_water: 0.0,
        }
    }

    /// Append an event; a terminal event also fixes the outcome if none is
    /// set yet.
    pub(crate) fn append(&mut self, event: ProgressEvent) -> &ProgressEvent {
        if self.outcome.is_none() {
            match event.phase {
                StatusPhase::Completed => self.outcome = Some(Outcome::Completed),
                StatusPhase::Failed => self.outcome = Some(Outcome::Failed),
                StatusPhase::Active => {}
            }
        }
        self.high_water = self.high_water.max(event.progress);
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.outcome.get_or_insert(outcome);
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&ProgressEvent> {
        self.events.last()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Highest progress seen so far. Never decreases, even when a source
    /// reports a lower value than an earlier event.
    pub fn progress(&self) -> f64 {
        self.high_water
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
