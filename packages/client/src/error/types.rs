use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

/// A Result alias where the Err case is `pulsewire_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the request executor, the stream decoder and the
/// push connection manager.
#[derive(Clone)]
pub struct Error {
    pub inner: Box<Inner>,
}

#[derive(Clone)]
pub struct Inner {
    pub kind: Kind,
    pub source: Option<Arc<dyn StdError + Send + Sync>>,
    pub url: Option<url::Url>,
    /// Name of the push connection the error belongs to, if any
    pub connection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Invalid request, URL or configuration
    Builder,
    /// Transport-level failure while sending a request
    Request,
    /// Failure establishing a push connection
    Connect,
    /// No response headers within the configured duration
    Timeout,
    /// Non-2xx response status
    Status(StatusCode),
    /// The underlying transport closed or failed mid-stream
    TransportClosed,
    /// Malformed NDJSON line or push message
    Parse,
    /// A single NDJSON record exceeded the configured size limit
    PayloadTooLarge,
    /// A push connection used up its reconnect attempts
    ReconnectExhausted,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
                connection: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(Arc::from(source.into()));
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    #[must_use]
    pub fn with_connection(mut self, name: impl Into<String>) -> Self {
        self.inner.connection = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Get the URL associated with this error, if any
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }

    /// Get the push connection name associated with this error, if any
    #[must_use]
    pub fn connection(&self) -> Option<&str> {
        self.inner.connection.as_deref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("pulsewire_client::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        if let Some(ref connection) = self.inner.connection {
            f.field("connection", connection);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Builder => f.write_str("builder error")?,
            Kind::Request => f.write_str("error sending request")?,
            Kind::Connect => f.write_str("error opening push connection")?,
            Kind::Timeout => f.write_str("request timeout")?,
            Kind::TransportClosed => f.write_str("transport closed")?,
            Kind::Parse => f.write_str("malformed JSON record")?,
            Kind::PayloadTooLarge => f.write_str("record exceeds size limit")?,
            Kind::ReconnectExhausted => f.write_str("reconnect attempts exhausted")?,
            Kind::Status(code) => {
                let prefix = if code.is_client_error() {
                    "HTTP status client error"
                } else if code.is_server_error() {
                    "HTTP status server error"
                } else {
                    "unexpected HTTP status"
                };
                write!(f, "{prefix} ({code})")?;
            }
        }

        if let Some(ref connection) = self.inner.connection {
            write!(f, " on '{connection}'")?;
        }
        if let Some(ref url) = self.inner.url {
            write!(f, " for url ({url})")?;
        }
        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
