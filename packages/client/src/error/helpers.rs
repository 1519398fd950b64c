use std::time::Duration;

/// A marker type to indicate that a request timed out.
#[derive(Debug, thiserror::Error)]
#[error("no response headers within {0:?}")]
pub struct TimedOut(pub Duration);

/// A marker type to indicate that a transport closed underneath a reader.
#[derive(Debug, thiserror::Error)]
#[error("connection closed")]
pub struct ConnectionClosed;

/// A line of an NDJSON stream that did not parse.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct MalformedRecord {
    pub line: u64,
    #[source]
    pub source: serde_json::Error,
}

/// An NDJSON line that grew past the decoder's size limit.
#[derive(Debug, thiserror::Error)]
#[error("line {line} exceeds {limit} bytes")]
pub struct OversizedRecord {
    pub line: u64,
    pub limit: usize,
}

/// A push connection gave up after its configured number of reconnects.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} reconnect attempts")]
pub struct AttemptsExhausted {
    pub attempts: u32,
}
