//! Core request executor
//!
//! Issues one request at a time against the configured base URL with a
//! time-to-headers limit. HTTP failures are returned to the caller as-is;
//! the executor never retries on its own.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::response::Parts;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use url::Url;

use super::stats::ClientStats;
use crate::config::ClientConfig;
use crate::error::{self, Result};
use crate::http::{ContentKind, ParsedBody, Request, ResponseStream};

const ACCEPTED_TYPES: &str = "application/json, application/x-ndjson, text/plain;q=0.5";

/// HTTP request executor with a pooled plain-HTTP connector.
///
/// Cloning is cheap and shares the connection pool and statistics.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client<HttpConnector, Full<Bytes>>,
    config: Arc<ClientConfig>,
    stats: Arc<ClientStats>,
}

impl RequestExecutor {
    /// Create an executor after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns a builder error if the configuration does not validate.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate().map_err(error::builder)?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeouts.connect_timeout));
        connector.set_nodelay(true);
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            config: Arc::new(config),
            stats: Arc::new(ClientStats::new()),
        })
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Statistics shared by every clone of this executor
    #[inline]
    pub fn stats(&self) -> Arc<ClientStats> {
        Arc::clone(&self.stats)
    }

    /// Resolve a request path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns a builder error if the joined URL is invalid.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.config.base_url.join(path).map_err(error::builder)
    }

    /// Issue `request` and interpret the body by its declared content type.
    ///
    /// # Errors
    ///
    /// - `Timeout` if no response headers arrive within the limit; the
    ///   in-flight request is dropped and its connection released.
    /// - `Status(code)` for a non-2xx response.
    /// - `Request` for transport failures, `Parse` for an undecodable body.
    pub async fn execute(&self, request: &Request) -> Result<ParsedBody> {
        let (url, parts, body) = self.send(request).await?;

        match ContentKind::from_headers(&parts.headers) {
            ContentKind::Json => {
                let bytes = collect(body, &url).await?;
                serde_json::from_slice(&bytes)
                    .map(ParsedBody::Json)
                    .map_err(|e| error::parse(e).with_url(url))
            }
            ContentKind::Text => {
                let bytes = collect(body, &url).await?;
                String::from_utf8(bytes.to_vec())
                    .map(ParsedBody::Text)
                    .map_err(|e| error::parse(e).with_url(url))
            }
            ContentKind::Opaque => Ok(ParsedBody::Stream(ResponseStream::from_incoming(
                parts.status,
                parts.headers,
                url,
                body,
            ))),
        }
    }

    /// Send `request` and wait for a successful status line and headers.
    pub(crate) async fn send(&self, request: &Request) -> Result<(Url, Parts, Incoming)> {
        let url = self.resolve(request.path())?;
        let http_request = self.build(&url, request)?;
        let limit = request
            .timeout_override()
            .unwrap_or(self.config.timeouts.request_timeout);

        self.stats.record_request();
        tracing::debug!(method = %request.method(), %url, "sending request");

        let response = match tokio::time::timeout(limit, self.client.request(http_request)).await {
            Err(_) => {
                self.stats.record_timeout();
                tracing::warn!(%url, ?limit, "request timed out waiting for response headers");
                return Err(error::timeout(url, limit));
            }
            Ok(Err(e)) => {
                self.stats.record_failure();
                tracing::warn!(%url, error = %e, "request failed");
                return Err(error::request(e).with_url(url));
            }
            Ok(Ok(response)) => response,
        };

        let (parts, body) = response.into_parts();
        if !parts.status.is_success() {
            self.stats.record_failure();
            tracing::debug!(%url, status = %parts.status, "non-success status");
            return Err(error::status_code(url, parts.status));
        }

        self.stats.record_success();
        Ok((url, parts, body))
    }

    fn build(&self, url: &Url, request: &Request) -> Result<http::Request<Full<Bytes>>> {
        let mut builder = http::Request::builder()
            .method(request.method().clone())
            .uri(url.as_str())
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header(ACCEPT, ACCEPTED_TYPES);

        let body = match request.body() {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(serde_json::to_vec(value).map_err(error::builder)?))
            }
            None => Full::new(Bytes::new()),
        };

        builder
            .body(body)
            .map_err(|e| error::builder(e).with_url(url.clone()))
    }

    /// Default time-to-headers limit
    #[inline]
    pub fn request_timeout(&self) -> Duration {
        self.config.timeouts.request_timeout
    }
}

async fn collect(body: Incoming, url: &Url) -> Result<Bytes> {
    body.collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| error::transport_closed(e).with_url(url.clone()))
}
