//! Odds module for bookmaker quotes and best-price aggregation.
//!
//! This module handles:
//! - Quote, snapshot and selection types
//! - Best-odd search across bookmakers
//! - Normalization of raw feed and stored records

pub mod aggregator;
pub mod record;
pub mod types;

pub use aggregator::{aggregate, best_for_outcome, coverage, find_best_odds, is_valid_odd};
pub use record::{
    parse_odd, record_label, RawBookmakerOdds, RawEventRecord, RawRecord, StoredSurebetRow,
};
pub use types::{
    BestOdd, BestOddsSelection, EventInfo, EventOddsSnapshot, Legs, MarketType, OddsQuote,
};
