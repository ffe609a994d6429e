//! Raw odds records and their normalization into [`EventOddsSnapshot`]s.
//!
//! Two source shapes are understood:
//!
//! - [`RawEventRecord`]: one document per event with a list of bookmakers,
//!   each carrying an `outcome -> odd` object (live or simulated feeds).
//! - [`StoredSurebetRow`]: a flat row with up to three legs
//!   (`odd_1`/`bookmaker_1` ...), as kept in stored snapshots and backups.
//!
//! Odd values may arrive as JSON numbers or strings, with either `.` or `,`
//! as decimal separator.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::aggregator::is_valid_odd;
use super::types::{EventInfo, EventOddsSnapshot, MarketType, OddsQuote};
use crate::error::OddsError;
use crate::metrics;

/// Labels used when a stored 2-way row does not name its outcomes.
pub const DEFAULT_TWO_WAY_LABELS: [&str; 2] = ["Home", "Away"];
/// Labels used when a stored 3-way row does not name its outcomes.
pub const DEFAULT_THREE_WAY_LABELS: [&str; 3] = ["Home", "Draw", "Away"];

/// Parse a raw odd into a positive decimal.
pub fn parse_odd(raw: &Value, bookmaker: &str, outcome: &str) -> Result<Decimal, OddsError> {
    let malformed = || OddsError::MalformedOddsValue {
        bookmaker: bookmaker.to_string(),
        outcome: outcome.to_string(),
        raw: raw.to_string(),
    };

    let odd = match raw {
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        Value::String(s) => Decimal::from_str(&s.trim().replace(',', ".")).ok(),
        _ => None,
    }
    .ok_or_else(malformed)?;

    if !is_valid_odd(odd) {
        return Err(malformed());
    }

    Ok(odd.normalize())
}

/// Odds of one bookmaker inside a [`RawEventRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBookmakerOdds {
    /// Bookmaker identifier.
    #[serde(alias = "id_casa")]
    pub id: String,
    /// Bookmaker display name.
    #[serde(alias = "nome_casa")]
    pub name: String,
    /// Outcome label to raw odd, in document order.
    pub odds: Map<String, Value>,
}

/// Event document from a live or simulated odds feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Event identifier.
    #[serde(alias = "id_evento")]
    pub event_id: String,
    /// Event description.
    #[serde(default, alias = "descricao_evento")]
    pub description: String,
    /// Sport.
    #[serde(default, alias = "esporte")]
    pub sport: String,
    /// League.
    #[serde(default, alias = "liga")]
    pub league: String,
    /// Event start time.
    #[serde(default, alias = "data_hora", skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    /// Explicit outcome labels. Defaults to the first bookmaker's keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<Vec<String>>,
    /// Quotes per bookmaker.
    #[serde(alias = "odds_por_casa")]
    pub bookmakers: Vec<RawBookmakerOdds>,
}

impl RawEventRecord {
    /// Normalize into a snapshot. Malformed odds are dropped individually.
    pub fn into_snapshot(self) -> Result<EventOddsSnapshot, OddsError> {
        let first = self.bookmakers.first().ok_or_else(|| OddsError::MissingField {
            record: self.event_id.clone(),
            field: "bookmakers",
        })?;

        let labels: Vec<String> = match self.outcomes {
            Some(labels) => labels,
            None => first.odds.keys().cloned().collect(),
        };

        let quotes = self
            .bookmakers
            .into_iter()
            .map(|book| {
                let odds = book.odds.iter().filter_map(|(outcome, raw)| {
                    match parse_odd(raw, &book.name, outcome) {
                        Ok(odd) => Some((outcome.clone(), odd)),
                        Err(e) => {
                            debug!(event = %self.event_id, error = %e, "Dropping odd");
                            metrics::inc_odds_dropped();
                            None
                        }
                    }
                });
                OddsQuote::new(book.id.clone(), book.name.clone(), odds)
            })
            .collect();

        let info = EventInfo {
            event_id: self.event_id,
            description: self.description,
            sport: self.sport,
            league: self.league,
            starts_at: self.starts_at,
        };

        EventOddsSnapshot::new(info, labels, quotes)
    }
}

/// Flat surebet row with one bookmaker per leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StoredSurebetRow {
    /// Storage identifier (string or `{"$oid": ...}`).
    #[serde(rename = "_id", default)]
    pub id: Option<Value>,
    /// Event description.
    #[serde(default, alias = "evento")]
    pub event: Option<String>,
    /// Alternative description field ("Team A x Team B").
    #[serde(default, alias = "times")]
    pub teams: Option<String>,
    /// Sport.
    #[serde(default, alias = "esporte")]
    pub sport: Option<String>,
    /// League.
    #[serde(default, alias = "liga")]
    pub league: Option<String>,
    /// Event start time.
    #[serde(default, alias = "data_hora")]
    pub starts_at: Option<String>,
    /// Outcome labels joined by `/`.
    #[serde(default, alias = "linha")]
    pub line: Option<String>,
    /// First leg odd.
    #[serde(default)]
    pub odd_1: Option<Value>,
    /// Second leg odd.
    #[serde(default)]
    pub odd_2: Option<Value>,
    /// Third leg odd, present for 3-way markets.
    #[serde(default)]
    pub odd_3: Option<Value>,
    /// First leg bookmaker.
    #[serde(default, alias = "casa_1")]
    pub bookmaker_1: Option<String>,
    /// Second leg bookmaker.
    #[serde(default, alias = "casa_2")]
    pub bookmaker_2: Option<String>,
    /// Third leg bookmaker.
    #[serde(default, alias = "casa_3")]
    pub bookmaker_3: Option<String>,
}

/// Absent, null, empty, zero or `false` all mean "no leg".
fn is_blank(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

impl StoredSurebetRow {
    /// Storage identifier as a plain string.
    pub fn record_id(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(obj)) => obj
                .get("$oid")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
            Some(other) if !other.is_null() => other.to_string(),
            _ => String::new(),
        }
    }

    fn labels(&self, market_type: MarketType) -> Vec<String> {
        let wanted = market_type.outcome_count();
        let named: Vec<String> = self
            .line
            .as_deref()
            .unwrap_or_default()
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if named.len() >= wanted {
            return named.into_iter().take(wanted).collect();
        }

        match market_type {
            MarketType::TwoWay => DEFAULT_TWO_WAY_LABELS.iter(),
            MarketType::ThreeWay => DEFAULT_THREE_WAY_LABELS.iter(),
        }
        .map(|s| s.to_string())
        .collect()
    }

    /// Normalize into a snapshot with one single-outcome quote per leg.
    ///
    /// Unlike feed records, a malformed leg invalidates the whole row.
    pub fn into_snapshot(self) -> Result<EventOddsSnapshot, OddsError> {
        let record = self.record_id();

        for (field, value) in [("odd_1", &self.odd_1), ("odd_2", &self.odd_2)] {
            if is_blank(value) {
                return Err(OddsError::MissingField {
                    record: record.clone(),
                    field,
                });
            }
        }

        let market_type = if is_blank(&self.odd_3) {
            MarketType::TwoWay
        } else {
            MarketType::ThreeWay
        };
        let labels = self.labels(market_type);

        let legs = [
            (&self.odd_1, &self.bookmaker_1),
            (&self.odd_2, &self.bookmaker_2),
            (&self.odd_3, &self.bookmaker_3),
        ];

        let null = Value::Null;
        let mut quotes = Vec::with_capacity(labels.len());
        for (label, (raw, bookmaker)) in labels.iter().zip(legs) {
            let name = bookmaker.clone().unwrap_or_default();
            let raw = raw.as_ref().unwrap_or(&null);
            let odd = parse_odd(raw, &name, label)?;
            quotes.push(OddsQuote::new(name.clone(), name, [(label.clone(), odd)]));
        }

        let info = EventInfo {
            event_id: record,
            description: self.event.or(self.teams).unwrap_or_default(),
            sport: self.sport.unwrap_or_default(),
            league: self.league.unwrap_or_default(),
            starts_at: self.starts_at,
        };

        EventOddsSnapshot::new(info, labels, quotes)
    }
}

/// Any raw record shape accepted by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRecord {
    /// Feed document.
    Event(RawEventRecord),
    /// Flat stored row.
    Stored(StoredSurebetRow),
}

impl RawRecord {
    /// Normalize into a snapshot.
    pub fn into_snapshot(self) -> Result<EventOddsSnapshot, OddsError> {
        match self {
            RawRecord::Event(record) => record.into_snapshot(),
            RawRecord::Stored(row) => row.into_snapshot(),
        }
    }
}

/// Best-effort identifier of a raw JSON record, for logging.
pub fn record_label(value: &Value) -> String {
    value
        .get("event_id")
        .or_else(|| value.get("id_evento"))
        .or_else(|| value.get("_id"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "?".to_string())
}
