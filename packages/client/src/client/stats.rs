//! Request executor statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Counters shared by every request issued through one executor
#[derive(Debug)]
pub struct ClientStats {
    /// Total number of requests issued
    pub requests_total: AtomicU64,
    /// Requests answered with a 2xx status
    pub requests_successful: AtomicU64,
    /// Requests that failed (transport error or non-2xx status)
    pub requests_failed: AtomicU64,
    /// Requests cancelled by the time-to-headers limit
    pub requests_timed_out: AtomicU64,
    /// Body bytes received on streaming responses
    pub bytes_received: AtomicU64,
    /// NDJSON records decoded on streaming responses
    pub records_decoded: AtomicU64,
    /// Malformed or oversized NDJSON lines
    pub parse_errors: AtomicU64,
    /// Client creation time
    pub created_at: Instant,
}

impl Default for ClientStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_successful: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_timed_out: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            records_decoded: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.requests_successful.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.requests_timed_out.fetch_add(1, Ordering::Relaxed);
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_decoded(&self) {
        self.records_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    #[must_use]
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_successful: self.requests_successful.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            requests_timed_out: self.requests_timed_out.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            uptime: self.created_at.elapsed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientStatsSnapshot {
    pub requests_total: u64,
    pub requests_successful: u64,
    pub requests_failed: u64,
    pub requests_timed_out: u64,
    pub bytes_received: u64,
    pub records_decoded: u64,
    pub parse_errors: u64,
    pub uptime: Duration,
}

impl ClientStatsSnapshot {
    /// Success rate (0.0 to 1.0); 1.0 before any request completes
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let total = self.requests_successful + self.requests_failed;
        if total == 0 {
            1.0
        } else {
            self.requests_successful as f64 / total as f64
        }
    }
}
