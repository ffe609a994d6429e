//! Sure-bet scanner for bookmaker odds.
//!
//! For each event, the best decimal odd per outcome is picked across all
//! bookmakers. If the implied probabilities of those odds sum to less than 1,
//! staking every outcome in proportion to its implied probability returns
//! the same amount whichever outcome wins:
//!
//! ```text
//! Home @ 2.05 (Book A)   1/2.05 = 0.4878
//! Away @ 1.95 (Book B)   1/1.95 = 0.5128
//! ────────────────────────────────────────
//! Sum:                            1.0006 >= 1  no arbitrage
//!
//! Home @ 2.10 (Book A)   1/2.10 = 0.4762
//! Away @ 2.00 (Book B)   1/2.00 = 0.5000
//! ────────────────────────────────────────
//! Sum:                            0.9762 < 1   2.38% guaranteed
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`odds`]: Odds records, snapshots and best-odds aggregation
//! - [`arbitrage`]: Stake calculation and batch scans
//! - [`feed`]: Simulated feed and JSON snapshot files
//! - [`metrics`]: Prometheus counters and latency histograms
//! - [`utils`]: Utility functions

pub mod arbitrage;
pub mod config;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod odds;
pub mod utils;

pub use config::Config;
pub use error::{Result, ScanError};
