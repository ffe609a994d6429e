//! Arbitrage module for evaluating events and scanning batches.
//!
//! This module handles:
//! - Implied probabilities and stake allocation
//! - Single-event evaluation and batch scans
//! - Near-miss diagnostics

pub mod calculator;
pub mod detector;

pub use calculator::{
    evaluate, implied_probability, implied_probability_sum, is_arbitrage, ArbitrageOpportunity,
    StakeAllocation, ARBITRAGE_EPSILON,
};
pub use detector::{
    diagnose, evaluate_event, normalize_feed, normalize_records, scan, scan_file, scan_parallel,
    scan_records, Diagnosis, EventOutcome, ScanReport,
};
