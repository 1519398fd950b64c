//! Request executor: single request/response and NDJSON streaming calls

pub mod core;
pub mod stats;
pub mod streaming;

pub use self::core::RequestExecutor;
pub use stats::{ClientStats, ClientStatsSnapshot};
pub use streaming::StreamSummary;
