//! Ingestion runs
//!
//! An ingestion run fetches recent papers into the backend's stores. It can
//! be started over HTTP, where the start endpoint answers with an NDJSON
//! progress stream, or by a `start_ingestion` message on the push channel.

use std::ops::RangeInclusive;

use pulsewire_client::config::ConfigurationError;
use pulsewire_client::error;
use pulsewire_client::http::ByteStream;
use pulsewire_client::{
    NdjsonStream, Operation, OperationTimeline, ParsedBody, ProgressEvent, Request,
    RequestExecutor, Result,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::core::{Pulsewire, endpoints};

pub const DAYS_RANGE: RangeInclusive<u32> = 1..=365;
pub const MAX_RESULTS_RANGE: RangeInclusive<u32> = 1..=1000;
pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_MAX_RESULTS: u32 = 100;

const OPERATION_NAME: &str = "ingest";

#[must_use = "builders do nothing until `run` is awaited"]
pub struct IngestionBuilder<'a> {
    client: &'a mut Pulsewire,
    days: u32,
    max_results: u32,
    via_push: bool,
}

impl<'a> IngestionBuilder<'a> {
    pub(crate) fn new(client: &'a mut Pulsewire) -> Self {
        Self {
            client,
            days: DEFAULT_DAYS,
            max_results: DEFAULT_MAX_RESULTS,
            via_push: false,
        }
    }

    /// How many days back to search, 1 to 365.
    pub fn days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Upper bound on papers fetched, 1 to 1000.
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Start with a push message instead of the HTTP start endpoint.
    pub fn via_push(mut self, via_push: bool) -> Self {
        self.via_push = via_push;
        self
    }

    fn validate(&self) -> Result<()> {
        if !DAYS_RANGE.contains(&self.days) {
            return Err(error::builder(ConfigurationError::InvalidParameter(
                "days must be between 1 and 365".to_string(),
            )));
        }
        if !MAX_RESULTS_RANGE.contains(&self.max_results) {
            return Err(error::builder(ConfigurationError::InvalidParameter(
                "max_results must be between 1 and 1000".to_string(),
            )));
        }
        Ok(())
    }

    /// Start the run and observe it until it ends.
    ///
    /// Over HTTP the start request must be accepted before observation
    /// begins. Its NDJSON body then reports progress alongside the push
    /// channel and the status poll, and is abandoned once the run ends.
    ///
    /// # Errors
    ///
    /// `Builder` for out-of-range parameters. In HTTP mode, any error of the
    /// start request. Failures after that are reported through the
    /// timeline's outcome.
    pub async fn run<F>(self, cancel: &CancellationToken, on_event: F) -> Result<OperationTimeline>
    where
        F: FnMut(&ProgressEvent),
    {
        self.validate()?;

        let operation = Operation::new(OPERATION_NAME, endpoints::INGEST_PUSH)
            .with_poll(Request::get(endpoints::INGEST_STATUS))
            .with_cancel_message(json!({"type": "cancel"}));

        if self.via_push {
            let operation = operation.with_start_message(json!({
                "type": "start_ingestion",
                "days": self.days,
                "max_results": self.max_results,
            }));
            return self.client.correlator.observe(&operation, cancel, on_event).await;
        }

        let request = Request::post(endpoints::INGEST_START).json_value(json!({
            "days": self.days,
            "max_results": self.max_results,
        }));
        match start_over_http(&self.client.executor, &request).await? {
            Some(records) => {
                self.client
                    .correlator
                    .observe_stream(&operation, records, cancel, on_event)
                    .await
            }
            None => self.client.correlator.observe(&operation, cancel, on_event).await,
        }
    }
}

/// Issue the start request and hand back its NDJSON records, if the
/// backend answered with a stream.
async fn start_over_http(
    executor: &RequestExecutor,
    request: &Request,
) -> Result<Option<NdjsonStream<ByteStream, Value>>> {
    match executor.execute(request).await? {
        ParsedBody::Stream(stream) => {
            tracing::debug!(url = %stream.url(), "ingestion started; following its stream");
            Ok(Some(stream.ndjson::<Value>()))
        }
        ParsedBody::Json(value) => {
            tracing::debug!(response = %value, "ingestion start answered without a stream");
            Ok(None)
        }
        ParsedBody::Text(text) => {
            tracing::debug!(response = %text, "ingestion start answered without a stream");
            Ok(None)
        }
    }
}
