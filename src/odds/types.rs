//! Odds types: bookmaker quotes, event snapshots and best-odd selections.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumString};

use crate::error::OddsError;

/// Per-outcome storage sized for the largest supported market.
pub type Legs<T> = SmallVec<[T; 3]>;

/// Number of mutually exclusive outcomes of an event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum MarketType {
    /// Two outcomes (e.g. tennis, basketball moneyline).
    #[strum(to_string = "2-way", serialize = "two-way")]
    #[serde(rename = "2-way")]
    TwoWay,
    /// Three outcomes (home / draw / away).
    #[strum(to_string = "3-way", serialize = "three-way")]
    #[serde(rename = "3-way")]
    ThreeWay,
}

impl MarketType {
    /// Market type for a given number of outcomes.
    pub fn from_outcome_count(count: usize) -> Option<Self> {
        match count {
            2 => Some(MarketType::TwoWay),
            3 => Some(MarketType::ThreeWay),
            _ => None,
        }
    }

    /// Number of outcomes in this market.
    pub fn outcome_count(&self) -> usize {
        match self {
            MarketType::TwoWay => 2,
            MarketType::ThreeWay => 3,
        }
    }
}

/// Descriptive fields of a sporting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventInfo {
    /// Unique event identifier.
    pub event_id: String,
    /// Human-readable description (e.g. "Team A vs Team B").
    pub description: String,
    /// Sport name.
    pub sport: String,
    /// League or competition.
    pub league: String,
    /// Kick-off time as supplied by the source, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
}

/// Odds offered by one bookmaker for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsQuote {
    /// Bookmaker identifier.
    pub bookmaker_id: String,
    /// Bookmaker display name.
    pub bookmaker_name: String,
    /// Decimal odd per outcome label.
    pub outcome_odds: HashMap<String, Decimal>,
}

impl OddsQuote {
    /// Create a quote from `(label, odd)` pairs.
    pub fn new<I, L>(bookmaker_id: impl Into<String>, bookmaker_name: impl Into<String>, odds: I) -> Self
    where
        I: IntoIterator<Item = (L, Decimal)>,
        L: Into<String>,
    {
        Self {
            bookmaker_id: bookmaker_id.into(),
            bookmaker_name: bookmaker_name.into(),
            outcome_odds: odds.into_iter().map(|(l, o)| (l.into(), o)).collect(),
        }
    }

    /// Odd quoted for an outcome, if any.
    pub fn odd(&self, outcome: &str) -> Option<Decimal> {
        self.outcome_odds.get(outcome).copied()
    }
}

/// All quotes collected for a single event at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOddsSnapshot {
    /// Event descriptors.
    pub info: EventInfo,
    /// 2-way or 3-way, derived from the outcome labels.
    pub market_type: MarketType,
    /// Ordered, distinct outcome labels.
    pub outcome_labels: Legs<String>,
    /// Quotes in source order. Order decides ties.
    pub quotes: Vec<OddsQuote>,
}

impl EventOddsSnapshot {
    /// Build a snapshot, validating the outcome labels.
    pub fn new<I, L>(info: EventInfo, outcome_labels: I, quotes: Vec<OddsQuote>) -> Result<Self, OddsError>
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let outcome_labels: Legs<String> = outcome_labels.into_iter().map(Into::into).collect();

        let market_type = MarketType::from_outcome_count(outcome_labels.len()).ok_or(
            OddsError::UnsupportedMarket {
                count: outcome_labels.len(),
            },
        )?;

        for (i, label) in outcome_labels.iter().enumerate() {
            if outcome_labels[..i].contains(label) {
                return Err(OddsError::DuplicateOutcome(label.clone()));
            }
        }

        Ok(Self {
            info,
            market_type,
            outcome_labels,
            quotes,
        })
    }

    /// Event identifier.
    pub fn event_id(&self) -> &str {
        &self.info.event_id
    }
}

/// Highest odd found for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOdd {
    /// Outcome label.
    pub outcome_label: String,
    /// Best decimal odd.
    pub odd: Decimal,
    /// Bookmaker offering it.
    pub bookmaker_name: String,
}

/// One best price per outcome, in outcome-label order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOddsSelection {
    /// Event the selection was computed for.
    pub event: EventInfo,
    /// Best odd per outcome.
    pub legs: Legs<BestOdd>,
}

impl BestOddsSelection {
    /// Best odd for a given outcome.
    pub fn leg(&self, outcome: &str) -> Option<&BestOdd> {
        self.legs.iter().find(|l| l.outcome_label == outcome)
    }

    /// Odds of all legs, in order.
    pub fn odds(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.legs.iter().map(|l| l.odd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn info() -> EventInfo {
        EventInfo {
            event_id: "evt-1".to_string(),
            description: "A vs B".to_string(),
            sport: "Football".to_string(),
            league: "League".to_string(),
            starts_at: None,
        }
    }

    #[test]
    fn market_type_from_count() {
        assert_eq!(MarketType::from_outcome_count(2), Some(MarketType::TwoWay));
        assert_eq!(MarketType::from_outcome_count(3), Some(MarketType::ThreeWay));
        assert_eq!(MarketType::from_outcome_count(1), None);
        assert_eq!(MarketType::from_outcome_count(4), None);
        assert_eq!(MarketType::ThreeWay.outcome_count(), 3);
    }

    #[test]
    fn market_type_display_and_parse() {
        assert_eq!(MarketType::TwoWay.to_string(), "2-way");
        assert_eq!(MarketType::ThreeWay.to_string(), "3-way");
        assert_eq!(MarketType::from_str("2-way").unwrap(), MarketType::TwoWay);
        assert_eq!(MarketType::from_str("three-way").unwrap(), MarketType::ThreeWay);
        assert_eq!(MarketType::from_str("3-way").unwrap(), MarketType::ThreeWay);
        assert_eq!(MarketType::from_str("two-way").unwrap(), MarketType::TwoWay);
        assert_eq!(
            serde_json::to_string(&MarketType::ThreeWay).unwrap(),
            "\"3-way\""
        );
    }

    #[test]
    fn snapshot_derives_market_type() {
        let snap = EventOddsSnapshot::new(info(), ["Home", "Draw", "Away"], vec![]).unwrap();
        assert_eq!(snap.market_type, MarketType::ThreeWay);
        assert_eq!(snap.event_id(), "evt-1");
    }

    #[test]
    fn snapshot_rejects_bad_label_sets() {
        assert_eq!(
            EventOddsSnapshot::new(info(), ["Only"], vec![]).unwrap_err(),
            OddsError::UnsupportedMarket { count: 1 }
        );
        assert_eq!(
            EventOddsSnapshot::new(info(), ["A", "B", "C", "D"], vec![]).unwrap_err(),
            OddsError::UnsupportedMarket { count: 4 }
        );
        assert_eq!(
            EventOddsSnapshot::new(info(), ["Home", "Home"], vec![]).unwrap_err(),
            OddsError::DuplicateOutcome("Home".to_string())
        );
    }

    #[test]
    fn quote_lookup() {
        let quote = OddsQuote::new("a", "BookA", [("Home", dec!(2.10)), ("Away", dec!(1.95))]);
        assert_eq!(quote.odd("Home"), Some(dec!(2.10)));
        assert_eq!(quote.odd("Draw"), None);
    }
}
