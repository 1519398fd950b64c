use std::time::Duration;

use super::helpers::{AttemptsExhausted, MalformedRecord, OversizedRecord, TimedOut};
use super::types::{Error, Kind};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a builder error.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for a request error.
pub fn request<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Request).with(e.into())
}

/// Creates an `Error` for a failed push connection attempt.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

/// Creates an `Error` for a request that saw no response headers in time.
pub fn timeout(url: url::Url, after: Duration) -> Error {
    Error::new(Kind::Timeout).with(TimedOut(after)).with_url(url)
}

pub fn status_code(url: url::Url, status: http::StatusCode) -> Error {
    Error::new(Kind::Status(status)).with_url(url)
}

/// Creates an `Error` for a transport that failed or closed mid-stream.
pub fn transport_closed<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::TransportClosed).with(e.into())
}

/// Creates an `Error` for an NDJSON line that failed to parse.
pub fn malformed_record(line: u64, source: serde_json::Error) -> Error {
    Error::new(Kind::Parse).with(MalformedRecord { line, source })
}

/// Creates an `Error` for a push message that failed to parse.
pub fn parse<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Parse).with(e.into())
}

pub fn oversized_record(line: u64, limit: usize) -> Error {
    Error::new(Kind::PayloadTooLarge).with(OversizedRecord { line, limit })
}

pub fn reconnect_exhausted(connection: &str, attempts: u32) -> Error {
    Error::new(Kind::ReconnectExhausted)
        .with(AttemptsExhausted { attempts })
        .with_connection(connection)
}
