//! Claim and fulfillment counters served at `/metrics`.
//!
//! HTTP handlers count claims; fulfiller tasks count deliveries, terminal
//! mint failures and refused callbacks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared between handlers and fulfiller tasks behind one `Arc`.
pub struct Metrics {
    /// Claims accepted and recorded as pending.
    pub claims_accepted: AtomicU64,
    /// Claims rejected (wrong price, oracle failure, collision).
    pub claims_rejected: AtomicU64,
    /// Fulfillments that resolved a claim and minted a ticket.
    pub fulfillments: AtomicU64,
    /// Fulfillments that consumed a claim but failed to mint.
    pub fulfillment_failures: AtomicU64,
    /// Callbacks refused (unknown request id or unauthenticated caller).
    pub callbacks_rejected: AtomicU64,
    /// Sum of event-to-mint latencies in milliseconds.
    pub fulfillment_latency_sum_ms: AtomicU64,
    /// Fulfillments contributing to the latency sum.
    pub fulfillment_count: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            claims_accepted: AtomicU64::new(0),
            claims_rejected: AtomicU64::new(0),
            fulfillments: AtomicU64::new(0),
            fulfillment_failures: AtomicU64::new(0),
            callbacks_rejected: AtomicU64::new(0),
            fulfillment_latency_sum_ms: AtomicU64::new(0),
            fulfillment_count: AtomicU64::new(0),
        }
    }

    pub fn record_claim(&self) {
        self.claims_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_claim(&self) {
        self.claims_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful fulfillment with its latency.
    pub fn record_fulfillment(&self, latency_ms: u64) {
        self.fulfillments.fetch_add(1, Ordering::Relaxed);
        self.fulfillment_latency_sum_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.fulfillment_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fulfillment whose mint failed.
    pub fn record_failure(&self) {
        self.fulfillment_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_callback(&self) {
        self.callbacks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Compute average fulfillment latency in milliseconds, or 0 if none.
    pub fn avg_latency_ms(&self) -> u64 {
        let count = self.fulfillment_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.fulfillment_latency_sum_ms.load(Ordering::Relaxed) / count
    }

    /// Serialize metrics as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "claims_accepted": self.claims_accepted.load(Ordering::Relaxed),
            "claims_rejected": self.claims_rejected.load(Ordering::Relaxed),
            "fulfillments": self.fulfillments.load(Ordering::Relaxed),
            "fulfillment_failures": self.fulfillment_failures.load(Ordering::Relaxed),
            "callbacks_rejected": self.callbacks_rejected.load(Ordering::Relaxed),
            "avg_fulfillment_latency_ms": self.avg_latency_ms(),
            "total_fulfillment_latency_ms": self.fulfillment_latency_sum_ms.load(Ordering::Relaxed),
            "fulfillment_count": self.fulfillment_count.load(Ordering::Relaxed),
        })
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_latency_is_zero_without_fulfillments() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_latency_ms(), 0);
    }

    #[test]
    fn reports_counters_in_json() {
        let metrics = Metrics::new();
        metrics.record_claim();
        metrics.record_claim();
        metrics.record_rejected_claim();
        metrics.record_fulfillment(10);
        metrics.record_fulfillment(30);
        metrics.record_failure();

        let json = metrics.to_json();
        assert_eq!(json["claims_accepted"], 2);
        assert_eq!(json["claims_rejected"], 1);
        assert_eq!(json["fulfillments"], 2);
        assert_eq!(json["fulfillment_failures"], 1);
        assert_eq!(json["avg_fulfillment_latency_ms"], 20);
    }
}
