//! Unified error types for the sure-bet scanner.

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the scanner.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Odds normalization/aggregation error.
    #[error("odds error: {0}")]
    Odds(#[from] OddsError),

    /// Arbitrage evaluation error.
    #[error("arbitrage error: {0}")]
    Arbitrage(#[from] ArbitrageError),

    /// Data feed error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Errors raised while turning raw odds into a usable market.
///
/// All of these are local to a single event.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OddsError {
    /// An odd could not be read as a finite positive decimal.
    #[error("malformed odd {raw:?} for outcome {outcome:?} at {bookmaker:?}")]
    MalformedOddsValue {
        /// Bookmaker quoting the value.
        bookmaker: String,
        /// Outcome label the value belongs to.
        outcome: String,
        /// Raw value as received.
        raw: String,
    },

    /// Some outcomes have no bookmaker offering a valid odd.
    #[error("incomplete market for event {event_id}: no valid odd for {missing:?}")]
    IncompleteMarket {
        /// Event that cannot be evaluated.
        event_id: String,
        /// Outcome labels without coverage.
        missing: Vec<String>,
    },

    /// Only 2-way and 3-way markets are supported.
    #[error("unsupported market with {count} outcomes (expected 2 or 3)")]
    UnsupportedMarket {
        /// Number of outcome labels observed.
        count: usize,
    },

    /// The same outcome label appears twice.
    #[error("duplicate outcome label {0:?}")]
    DuplicateOutcome(String),

    /// A mandatory field is absent from a raw record.
    #[error("missing field {field} in record {record}")]
    MissingField {
        /// Record identifier (or "?" when unknown).
        record: String,
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Arbitrage evaluation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbitrageError {
    /// Total investment must be strictly positive.
    #[error("invalid investment: {0} (must be > 0)")]
    InvalidInvestment(Decimal),

    /// Selection does not have one leg per outcome of the market.
    #[error("outcome count mismatch: market expects {expected}, selection has {actual}")]
    OutcomeCountMismatch {
        /// Outcomes required by the market type.
        expected: usize,
        /// Legs present in the selection.
        actual: usize,
    },

    /// Stake arithmetic left the decimal range.
    #[error("stake calculation overflowed for investment {investment}")]
    Overflow {
        /// Requested investment.
        investment: Decimal,
    },
}

/// Data feed errors.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Requested event is not served by the feed.
    #[error("event {0} not found in feed")]
    UnknownEvent(String),

    /// Snapshot file is not a JSON array of records.
    #[error("snapshot file {path} is not a JSON array")]
    NotAnArray {
        /// Offending file.
        path: String,
    },

    /// Failed to read the snapshot file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the snapshot file.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File path.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to encode records as JSON.
    #[error("failed to encode records for {path}: {source}")]
    Encode {
        /// File path.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write the snapshot file.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ScanError>;
