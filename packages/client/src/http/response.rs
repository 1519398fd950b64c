//! Response bodies interpreted by declared content type
//!
//! Structured JSON bodies are parsed, text bodies are returned verbatim and
//! everything else (NDJSON included) is handed back as a [`ResponseStream`]
//! for the caller to consume chunk by chunk.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyDataStream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::decoder::{NdjsonDecoder, NdjsonStream};
use crate::error::{self, Result};

/// Boxed stream of raw body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// How a response body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `application/json` or any `+json` suffix type
    Json,
    /// Any `text/*` type
    Text,
    /// Everything else, including `application/x-ndjson`
    Opaque,
}

impl ContentKind {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(ContentKind::Opaque, Self::from_mime)
    }

    #[must_use]
    pub fn from_mime(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/json" || essence.ends_with("+json") {
            ContentKind::Json
        } else if essence.starts_with("text/") {
            ContentKind::Text
        } else {
            ContentKind::Opaque
        }
    }
}

/// Body of a successful response
#[derive(Debug)]
pub enum ParsedBody {
    Json(Value),
    Text(String),
    Stream(ResponseStream),
}

impl ParsedBody {
    /// The parsed JSON value, if the body was declared as JSON
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParsedBody::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_stream(self) -> Option<ResponseStream> {
        match self {
            ParsedBody::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Opaque handle over a response body that has not been read yet.
///
/// Dropping the handle releases the underlying connection.
pub struct ResponseStream {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: ByteStream,
}

impl ResponseStream {
    pub(crate) fn from_incoming(
        status: StatusCode,
        headers: HeaderMap,
        url: Url,
        incoming: hyper::body::Incoming,
    ) -> Self {
        let body = BodyDataStream::new(incoming).map_err(error::transport_closed);
        Self::from_stream(status, headers, url, body)
    }

    /// Wrap an arbitrary chunk stream, e.g. one replayed from a recording.
    pub fn from_stream<S>(status: StatusCode, headers: HeaderMap, url: Url, body: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            status,
            headers,
            url,
            body: Box::pin(body),
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Await the next raw body chunk; `None` once the body is complete.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        self.body.next().await
    }

    /// Decode the body lazily as NDJSON records.
    pub fn ndjson<T: DeserializeOwned>(self) -> NdjsonStream<ByteStream, T> {
        NdjsonStream::with_decoder(self.body, NdjsonDecoder::new())
    }

    pub fn into_byte_stream(self) -> ByteStream {
        self.body
    }
}

impl fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .field("content_type", &self.headers.get(CONTENT_TYPE))
            .finish_non_exhaustive()
    }
}
