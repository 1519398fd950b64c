//! Newline-delimited JSON decoding for chunked response bodies

pub mod ndjson;
pub mod stream;

pub use ndjson::{DEFAULT_MAX_RECORD_BYTES, NdjsonDecoder};
pub use stream::NdjsonStream;
