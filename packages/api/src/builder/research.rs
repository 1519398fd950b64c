//! Research analyses
//!
//! `run` starts an analysis with an `execute_analysis` push message and
//! follows its progress on the research push channel. `execute` calls the
//! blocking HTTP query endpoint instead and returns its answer document.

use pulsewire_client::config::ConfigurationError;
use pulsewire_client::error;
use pulsewire_client::{Operation, OperationTimeline, ProgressEvent, Request, Result};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::core::{Pulsewire, endpoints, json_body};

pub const MIN_QUERY_CHARS: usize = 3;
pub const DEFAULT_ANALYSIS_TYPE: &str = "comprehensive";

const OPERATION_NAME: &str = "research";

#[must_use = "builders do nothing until `run` or `execute` is awaited"]
pub struct ResearchBuilder<'a> {
    client: &'a mut Pulsewire,
    query: String,
    analysis_type: String,
}

impl<'a> ResearchBuilder<'a> {
    pub(crate) fn new(client: &'a mut Pulsewire, query: String) -> Self {
        Self {
            client,
            query,
            analysis_type: DEFAULT_ANALYSIS_TYPE.to_string(),
        }
    }

    pub fn analysis_type(mut self, analysis_type: impl Into<String>) -> Self {
        self.analysis_type = analysis_type.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.query.trim().chars().count() < MIN_QUERY_CHARS {
            return Err(error::builder(ConfigurationError::InvalidParameter(
                "query must be at least 3 characters".to_string(),
            )));
        }
        Ok(())
    }

    fn body(&self) -> Value {
        json!({
            "query": self.query.trim(),
            "analysis_type": self.analysis_type,
        })
    }

    /// Start the analysis over the push channel and observe it until it
    /// ends.
    ///
    /// There is no status endpoint for analyses, so the push channel is the
    /// only source; if it gives up reconnecting the outcome is
    /// `SourcesLost`.
    ///
    /// # Errors
    ///
    /// `Builder` for a query shorter than three characters.
    pub async fn run<F>(self, cancel: &CancellationToken, on_event: F) -> Result<OperationTimeline>
    where
        F: FnMut(&ProgressEvent),
    {
        self.validate()?;

        let mut start = self.body();
        start["type"] = json!("execute_analysis");
        let operation = Operation::new(OPERATION_NAME, endpoints::RESEARCH_PUSH)
            .with_start_message(start)
            .with_cancel_message(json!({"type": "cancel"}));

        self.client
            .correlator
            .observe(&operation, cancel, on_event)
            .await
    }

    /// Run the analysis through `api/research/query/` and return the
    /// backend's answer.
    ///
    /// # Errors
    ///
    /// `Builder` for a short query, any executor error, or `Parse` if the
    /// answer is not JSON.
    pub async fn execute(self) -> Result<Value> {
        self.validate()?;

        let request = Request::post(endpoints::RESEARCH_QUERY).json_value(self.body());
        json_body(self.client.executor.execute(&request).await?)
    }
}
