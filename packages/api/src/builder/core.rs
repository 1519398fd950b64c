//! Core `Pulsewire` client
//!
//! Owns the request executor and the progress correlator (and through it
//! the push connection manager) for one backend.

use pulsewire_client::config::ConfigurationError;
use pulsewire_client::error;
use pulsewire_client::{
    ClientConfig, ConnectionManager, ParsedBody, ProgressCorrelator, Request, RequestExecutor,
    Result, WsTransport,
};
use serde_json::Value;

use super::ingestion::IngestionBuilder;
use super::research::ResearchBuilder;

/// Backend paths, relative to the configured base URL
pub mod endpoints {
    pub const HEALTH: &str = "api/health/";
    pub const INGEST_START: &str = "api/ingest/start/";
    pub const INGEST_STATUS: &str = "api/ingest/status/";
    pub const RESEARCH_QUERY: &str = "api/research/query/";
    /// Prefix of stored analyses, `api/research/<id>/`
    pub const RESEARCH_RESULT: &str = "api/research/";
    pub const INGEST_PUSH: &str = "ws/ingest/";
    pub const RESEARCH_PUSH: &str = "ws/research/";
}

/// Client for the research backend's long-running operations.
///
/// One value per backend. Operations run one at a time: the builders borrow
/// the client mutably for the duration of `run`.
pub struct Pulsewire {
    pub(crate) executor: RequestExecutor,
    pub(crate) correlator: ProgressCorrelator<WsTransport, RequestExecutor>,
}

impl Pulsewire {
    /// Build a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// `Builder` if the configuration does not validate.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let executor = RequestExecutor::new(config.clone())?;
        let transport = WsTransport::from_config(&config)?;
        let connections = ConnectionManager::new(transport, config.reconnect.clone())
            .with_close_timeout(config.timeouts.close_timeout);
        let correlator = ProgressCorrelator::new(connections, executor.clone(), config.progress);

        tracing::debug!(base_url = %executor.config().base_url, "pulsewire client ready");
        Ok(Self {
            executor,
            correlator,
        })
    }

    /// Shorthand for [`Pulsewire::new`] with default settings.
    pub fn connect(base_url: &str) -> Result<Self> {
        let config = ClientConfig::new(base_url).map_err(error::builder)?;
        Self::new(config)
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn connections(&self) -> &ConnectionManager<WsTransport> {
        self.correlator.connections()
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager<WsTransport> {
        self.correlator.connections_mut()
    }

    /// Probe `api/health/` and return its JSON document.
    ///
    /// # Errors
    ///
    /// Any executor error, or `Parse` if the body is not JSON.
    pub async fn health(&self) -> Result<Value> {
        json_body(self.executor.execute(&Request::get(endpoints::HEALTH)).await?)
    }

    /// Fetch a stored analysis by id from `api/research/<id>/`.
    ///
    /// # Errors
    ///
    /// `Builder` for an empty id or one containing `/`, `Status(404)` for an
    /// unknown analysis, or `Parse` if the body is not JSON.
    pub async fn analysis(&self, id: &str) -> Result<Value> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(error::builder(ConfigurationError::InvalidParameter(format!(
                "invalid analysis id '{id}'"
            ))));
        }
        let path = format!("{}{id}/", endpoints::RESEARCH_RESULT);
        json_body(self.executor.execute(&Request::get(path)).await?)
    }

    /// Start configuring an ingestion run.
    pub fn ingestion(&mut self) -> IngestionBuilder<'_> {
        IngestionBuilder::new(self)
    }

    /// Start configuring a research analysis for `query`.
    pub fn research(&mut self, query: impl Into<String>) -> ResearchBuilder<'_> {
        ResearchBuilder::new(self, query.into())
    }

    /// Close every push connection.
    pub async fn shutdown(&mut self) {
        self.correlator.connections_mut().close_all().await;
    }
}

/// Require a JSON document, accepting JSON served as text.
pub(crate) fn json_body(body: ParsedBody) -> Result<Value> {
    match body {
        ParsedBody::Json(value) => Ok(value),
        ParsedBody::Text(text) => serde_json::from_str(&text).map_err(error::parse),
        ParsedBody::Stream(stream) => Err(error::parse(format!(
            "expected a JSON document, got a {} stream",
            stream.status()
        ))
        .with_url(stream.url().clone())),
    }
}
