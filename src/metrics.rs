//! Prometheus metrics for scan throughput and outcomes.
//!
//! This module provides metrics for:
//! - Events scanned and opportunities found
//! - Events skipped, by reason
//! - Raw records and odds rejected during normalization
//! - Batch scan latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Events scanned counter metric name.
pub const METRIC_EVENTS_SCANNED: &str = "events_scanned_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Skipped events counter metric name (labelled by reason).
pub const METRIC_EVENTS_SKIPPED: &str = "events_skipped_total";
/// Malformed raw records counter metric name.
pub const METRIC_RECORDS_MALFORMED: &str = "records_malformed_total";
/// Dropped odd values counter metric name.
pub const METRIC_ODDS_DROPPED: &str = "odds_dropped_total";
/// Batch scan latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "scan_latency_ms";

/// Why an event produced no opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Raw record could not be normalized.
    Malformed,
    /// Some outcome had no valid odd.
    Incomplete,
    /// Implied probabilities sum to 1 or more.
    NoArbitrage,
    /// Stake arithmetic failed.
    Failed,
}

impl SkipReason {
    /// Label value used on the skip counter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Malformed => "malformed",
            SkipReason::Incomplete => "incomplete",
            SkipReason::NoArbitrage => "no_arbitrage",
            SkipReason::Failed => "failed",
        }
    }
}

/// Initialize all metric descriptions.
/// Call this once at startup, after installing a recorder.
pub fn init_metrics() {
    describe_counter!(METRIC_EVENTS_SCANNED, "Total number of events evaluated");
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(
        METRIC_EVENTS_SKIPPED,
        "Events that yielded no opportunity, by reason"
    );
    describe_counter!(
        METRIC_RECORDS_MALFORMED,
        "Raw records that could not be normalized"
    );
    describe_counter!(
        METRIC_ODDS_DROPPED,
        "Individual odd values dropped as malformed"
    );
    describe_histogram!(METRIC_SCAN_LATENCY, "Batch scan latency in milliseconds");

    debug!("Metrics initialized");
}

/// Increment events scanned counter.
pub fn inc_events_scanned() {
    counter!(METRIC_EVENTS_SCANNED).increment(1);
}

/// Increment opportunities detected counter.
pub fn inc_opportunities_detected() {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(1);
}

/// Increment skipped events counter.
pub fn inc_events_skipped(reason: SkipReason) {
    counter!(METRIC_EVENTS_SKIPPED, "reason" => reason.as_str()).increment(1);
}

/// Increment malformed records counter.
pub fn inc_records_malformed() {
    counter!(METRIC_RECORDS_MALFORMED).increment(1);
}

/// Increment dropped odds counter.
pub fn inc_odds_dropped() {
    counter!(METRIC_ODDS_DROPPED).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a batch scan.
pub fn timer_scan() -> LatencyTimer {
    LatencyTimer::new(METRIC_SCAN_LATENCY)
}
