//! Pulsewire prelude
//!
//! The types a consumer needs for requests, streams, push connections and
//! progress observation.

// Errors
pub use crate::error::{Error, Kind, Result};

// Requests and responses
pub use crate::client::{ClientStats, ClientStatsSnapshot, RequestExecutor, StreamSummary};
pub use crate::http::{ParsedBody, Request, ResponseStream};

// Configuration
pub use crate::config::{
    ClientConfig, ConfigurationError, ProgressConfig, StatusContract, TimeoutConfig,
};
pub use crate::retry::ReconnectPolicy;

// Decoding
pub use crate::decoder::{NdjsonDecoder, NdjsonStream};

// Push connections
pub use crate::push::{
    CloseReason, ConnectionHandlers, ConnectionManager, ConnectionState, PushTransport,
    WsTransport,
};

// Progress
pub use crate::progress::{
    EventSource, Operation, OperationTimeline, Outcome, ProgressCorrelator, ProgressEvent,
    StatusPhase, StatusPoller,
};

// HTTP standard types from http crate
pub use ::http::{Method, StatusCode};

// URL handling
pub use url::Url;
