//! Gateway counters, exposed as JSON at `/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Request counters
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_client_error: AtomicU64,
    pub requests_server_error: AtomicU64,

    // Chain counters
    pub submissions_total: AtomicU64,
    pub submission_failures: AtomicU64,
    pub raw_relays_total: AtomicU64,

    // Feed counters
    pub feed_events_total: AtomicU64,
    pub feed_failures: AtomicU64,

    // Registration confirmation
    pub registrations_pending: AtomicU64,
    pub confirmations_confirmed: AtomicU64,
    pub confirmations_timed_out: AtomicU64,
    pub confirmation_poll_errors: AtomicU64,

    // Latency tracking (simplified - in production use histograms)
    pub total_latency_ms: AtomicU64,
    pub request_count_for_latency: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished request by its HTTP status
    pub fn record_request(&self, status: u16, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        match status {
            0..=399 => self.requests_success.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.requests_client_error.fetch_add(1, Ordering::Relaxed),
            _ => self.requests_server_error.fetch_add(1, Ordering::Relaxed),
        };

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission(&self, success: bool) {
        self.submissions_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.submission_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_raw_relay(&self) {
        self.raw_relays_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feed(&self, success: bool) {
        self.feed_events_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.feed_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A registration wait started
    pub fn record_pending_started(&self) {
        self.registrations_pending.fetch_add(1, Ordering::Relaxed);
    }

    /// A registration wait ended; `confirmed` is false on timeout
    pub fn record_pending_finished(&self, confirmed: bool) {
        self.registrations_pending.fetch_sub(1, Ordering::Relaxed);
        if confirmed {
            self.confirmations_confirmed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.confirmations_timed_out.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_poll_error(&self) {
        self.confirmation_poll_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "client_error": self.requests_client_error.load(Ordering::Relaxed),
                "server_error": self.requests_server_error.load(Ordering::Relaxed),
            },
            "chain": {
                "submissions": self.submissions_total.load(Ordering::Relaxed),
                "submission_failures": self.submission_failures.load(Ordering::Relaxed),
                "raw_relays": self.raw_relays_total.load(Ordering::Relaxed),
            },
            "feed": {
                "events": self.feed_events_total.load(Ordering::Relaxed),
                "failures": self.feed_failures.load(Ordering::Relaxed),
            },
            "registrations": {
                "pending": self.registrations_pending.load(Ordering::Relaxed),
                "confirmed": self.confirmations_confirmed.load(Ordering::Relaxed),
                "timed_out": self.confirmations_timed_out.load(Ordering::Relaxed),
                "poll_errors": self.confirmation_poll_errors.load(Ordering::Relaxed),
            },
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

/// Request timing helper
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<GatewayMetrics>,
}

impl RequestTimer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    pub fn finish(self, status: u16) {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.metrics.record_request(status, latency_ms);
    }
}
