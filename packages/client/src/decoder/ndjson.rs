//! Incremental newline-delimited JSON decoder
//!
//! Raw bytes are buffered and only complete lines are decoded, so a chunk
//! boundary inside a multi-byte UTF-8 sequence or inside a JSON value never
//! changes the result. The buffer never holds a newline: every complete line
//! is decoded as soon as its delimiter arrives.

use std::marker::PhantomData;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{self, Result};

/// Default upper bound for a single NDJSON line (16 MiB)
pub const DEFAULT_MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

/// Decoder state for one in-flight NDJSON response.
#[derive(Debug)]
pub struct NdjsonDecoder<T = Value> {
    buffer: BytesMut,
    /// Prefix of `buffer` already scanned and known to contain no newline
    scanned: usize,
    max_record_bytes: usize,
    /// Skipping the rest of an oversized line until its newline arrives
    discarding: bool,
    lines_seen: u64,
    records_emitted: u64,
    parse_errors: u64,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Default for NdjsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> NdjsonDecoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_record_bytes(DEFAULT_MAX_RECORD_BYTES)
    }

    #[must_use]
    pub fn with_max_record_bytes(max_record_bytes: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_record_bytes,
            discarding: false,
            lines_seen: 0,
            records_emitted: 0,
            parse_errors: 0,
            _record: PhantomData,
        }
    }

    /// Append a chunk and decode every line it completes, in order.
    ///
    /// A line that fails to parse yields an `Err` of kind `Parse` in its
    /// position; the lines after it are still decoded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<T>> {
        let mut out = Vec::new();
        if chunk.is_empty() {
            return out;
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(offset) = memchr::memchr(b'\n', &self.buffer[self.scanned..]) {
            let end = self.scanned + offset;
            let line = self.buffer.split_to(end + 1);
            self.scanned = 0;
            self.lines_seen += 1;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if end > self.max_record_bytes {
                out.push(self.oversized(self.lines_seen));
                continue;
            }
            if let Some(item) = self.decode_line(&line[..end]) {
                out.push(item);
            }
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_record_bytes {
            if !self.discarding {
                out.push(self.oversized(self.lines_seen + 1));
            }
            self.discarding = true;
            self.buffer.clear();
            self.scanned = 0;
        }

        out
    }

    /// Signal end of data.
    ///
    /// A residual line without its terminating newline is discarded, never
    /// parsed, so this always returns an empty sequence.
    pub fn finish(&mut self) -> Vec<Result<T>> {
        let residual = self.buffer.trim_ascii();
        if !residual.is_empty() && !self.discarding {
            tracing::debug!(
                bytes = residual.len(),
                "dropping unterminated trailing NDJSON record"
            );
        }
        self.buffer.clear();
        self.scanned = 0;
        self.discarding = false;
        Vec::new()
    }

    /// Number of records successfully decoded so far
    #[inline]
    #[must_use]
    pub fn records_emitted(&self) -> u64 {
        self.records_emitted
    }

    /// Number of malformed or oversized lines reported so far
    #[inline]
    #[must_use]
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    /// Bytes held for the current unterminated line
    #[inline]
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn oversized(&mut self, line: u64) -> Result<T> {
        self.parse_errors += 1;
        tracing::warn!(
            line,
            limit = self.max_record_bytes,
            "NDJSON record exceeds size limit, skipping to next line"
        );
        Err(error::oversized_record(line, self.max_record_bytes))
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<Result<T>> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_slice::<T>(line) {
            Ok(record) => {
                self.records_emitted += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.parse_errors += 1;
                tracing::debug!(line = self.lines_seen, error = %e, "malformed NDJSON line");
                Some(Err(error::malformed_record(self.lines_seen, e)))
            }
        }
    }
}
