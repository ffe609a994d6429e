//! Batch opportunity scan over event snapshots.

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::calculator::{evaluate, implied_probability_sum, ArbitrageOpportunity, ARBITRAGE_EPSILON};
use crate::error::{ArbitrageError, OddsError};
use crate::feed::load_records;
use crate::metrics::{self, SkipReason};
use crate::odds::{
    aggregate, best_for_outcome, record_label, BestOdd, EventOddsSnapshot, RawEventRecord, RawRecord,
};

/// Result of evaluating one event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Arbitrage found.
    Opportunity(Box<ArbitrageOpportunity>),
    /// Some outcome had no valid odd.
    Incomplete,
    /// Odds leave no margin.
    NoArbitrage,
    /// Stake arithmetic failed.
    Failed,
}

/// Opportunities found in one pass, plus skip counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Opportunities in input order.
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// Events that reached aggregation.
    pub events_scanned: usize,
    /// Raw records that could not be normalized.
    pub malformed: usize,
    /// Events with an uncovered outcome.
    pub incomplete: usize,
    /// Events whose odds leave no margin.
    pub no_arbitrage: usize,
    /// Events whose evaluation failed.
    pub failed: usize,
}

impl ScanReport {
    /// Opportunities whose profit percentage is at least `min_profit_pct`.
    pub fn above_threshold(&self, min_profit_pct: Decimal) -> Vec<&ArbitrageOpportunity> {
        self.opportunities
            .iter()
            .filter(|o| o.profit_percentage >= min_profit_pct)
            .collect()
    }

    fn record(&mut self, outcome: EventOutcome) {
        self.events_scanned += 1;
        match outcome {
            EventOutcome::Opportunity(opp) => self.opportunities.push(*opp),
            EventOutcome::Incomplete => self.incomplete += 1,
            EventOutcome::NoArbitrage => self.no_arbitrage += 1,
            EventOutcome::Failed => self.failed += 1,
        }
    }
}

fn check_investment(total_investment: Decimal) -> Result<(), ArbitrageError> {
    if total_investment <= Decimal::ZERO {
        return Err(ArbitrageError::InvalidInvestment(total_investment));
    }
    Ok(())
}

/// Aggregate and evaluate a single event.
///
/// Errors stay local: anything other than an opportunity is reported as a
/// skip outcome.
#[instrument(skip(snapshot), fields(event = %snapshot.info.event_id))]
pub fn evaluate_event(snapshot: &EventOddsSnapshot, total_investment: Decimal) -> EventOutcome {
    metrics::inc_events_scanned();

    let selection = match aggregate(snapshot) {
        Ok(selection) => selection,
        Err(e) => {
            debug!(error = %e, "Skipping event");
            metrics::inc_events_skipped(SkipReason::Incomplete);
            return EventOutcome::Incomplete;
        }
    };

    match evaluate(&selection, snapshot.market_type, total_investment) {
        Ok(Some(opp)) => {
            info!(
                implied_sum = %opp.implied_probability_sum,
                profit_pct = %opp.profit_percentage,
                guaranteed_return = %opp.guaranteed_return,
                "Arbitrage opportunity detected"
            );
            metrics::inc_opportunities_detected();
            EventOutcome::Opportunity(Box::new(opp))
        }
        Ok(None) => {
            metrics::inc_events_skipped(SkipReason::NoArbitrage);
            EventOutcome::NoArbitrage
        }
        Err(e) => {
            warn!(error = %e, "Evaluation failed");
            metrics::inc_events_skipped(SkipReason::Failed);
            EventOutcome::Failed
        }
    }
}

/// Scan snapshots in order and collect every opportunity.
pub fn scan(
    snapshots: &[EventOddsSnapshot],
    total_investment: Decimal,
) -> Result<ScanReport, ArbitrageError> {
    check_investment(total_investment)?;
    let _timer = metrics::timer_scan();

    let mut report = ScanReport::default();
    for snapshot in snapshots {
        report.record(evaluate_event(snapshot, total_investment));
    }

    debug!(
        events = report.events_scanned,
        opportunities = report.opportunities.len(),
        "Scan complete"
    );
    Ok(report)
}

/// Same as [`scan`], evaluating events on the rayon thread pool.
///
/// Output order still follows input order.
pub fn scan_parallel(
    snapshots: &[EventOddsSnapshot],
    total_investment: Decimal,
) -> Result<ScanReport, ArbitrageError> {
    check_investment(total_investment)?;
    let _timer = metrics::timer_scan();

    let outcomes: Vec<EventOutcome> = snapshots
        .par_iter()
        .map(|snapshot| evaluate_event(snapshot, total_investment))
        .collect();

    let mut report = ScanReport::default();
    for outcome in outcomes {
        report.record(outcome);
    }
    Ok(report)
}

/// Keep normalized snapshots and count (and log) the rejected ones.
fn collect_snapshots<I>(results: I) -> (Vec<EventOddsSnapshot>, usize)
where
    I: IntoIterator<Item = (String, Result<EventOddsSnapshot, String>)>,
{
    let mut snapshots = Vec::new();
    let mut malformed = 0;

    for (label, normalized) in results {
        match normalized {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(reason) => {
                warn!(record = %label, reason = %reason, "Skipping malformed record");
                metrics::inc_records_malformed();
                metrics::inc_events_skipped(SkipReason::Malformed);
                malformed += 1;
            }
        }
    }

    (snapshots, malformed)
}

/// Normalize raw JSON records into snapshots.
///
/// Returns the snapshots in input order and the number of records skipped.
pub fn normalize_records(records: &[Value]) -> (Vec<EventOddsSnapshot>, usize) {
    collect_snapshots(records.iter().map(|value| {
        let normalized = serde_json::from_value::<RawRecord>(value.clone())
            .map_err(|e| e.to_string())
            .and_then(|record| record.into_snapshot().map_err(|e: OddsError| e.to_string()));
        (record_label(value), normalized)
    }))
}

/// Normalize typed feed documents into snapshots, same accounting as
/// [`normalize_records`].
pub fn normalize_feed(records: Vec<RawEventRecord>) -> (Vec<EventOddsSnapshot>, usize) {
    collect_snapshots(records.into_iter().map(|record| {
        let label = record.event_id.clone();
        (label, record.into_snapshot().map_err(|e| e.to_string()))
    }))
}

/// Normalize raw records and scan them.
///
/// Malformed records are counted and skipped; they never abort the batch.
pub fn scan_records(
    records: &[Value],
    total_investment: Decimal,
    parallel: bool,
) -> Result<ScanReport, ArbitrageError> {
    check_investment(total_investment)?;

    let (snapshots, malformed) = normalize_records(records);
    let mut report = if parallel {
        scan_parallel(&snapshots, total_investment)?
    } else {
        scan(&snapshots, total_investment)?
    };
    report.malformed = malformed;
    Ok(report)
}

/// Load a snapshot file and scan its records.
pub fn scan_file(
    path: impl AsRef<std::path::Path>,
    total_investment: Decimal,
    parallel: bool,
) -> crate::Result<ScanReport> {
    let records = load_records(path)?;
    Ok(scan_records(&records, total_investment, parallel)?)
}

/// Near-miss information for an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    /// Event identifier.
    pub event_id: String,
    /// Best odd per covered outcome.
    pub best_odds: Vec<BestOdd>,
    /// Outcomes without any valid odd.
    pub missing: Vec<String>,
    /// Implied-probability sum over the best odds, if complete.
    pub implied_sum: Option<Decimal>,
}

impl Diagnosis {
    /// How far the sum is above the arbitrage line (positive = no arb).
    pub fn gap(&self) -> Option<Decimal> {
        self.implied_sum
            .map(|sum| sum - (Decimal::ONE - ARBITRAGE_EPSILON))
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let legs = self
            .best_odds
            .iter()
            .map(|l| format!("{}={}@{}", l.outcome_label, l.odd, l.bookmaker_name))
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "{} | {} | sum={}",
            self.event_id,
            legs,
            self.implied_sum
                .map(|d| d.round_dp(4).to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        )?;
        if !self.missing.is_empty() {
            write!(f, " | missing={}", self.missing.join(","))?;
        }
        Ok(())
    }
}

/// Explain where an event stands relative to arbitrage.
pub fn diagnose(snapshot: &EventOddsSnapshot) -> Diagnosis {
    let (best_odds, missing) = match aggregate(snapshot) {
        Ok(selection) => (selection.legs.into_vec(), Vec::new()),
        Err(OddsError::IncompleteMarket { missing, .. }) => {
            let best = snapshot
                .outcome_labels
                .iter()
                .filter(|label| !missing.contains(*label))
                .filter_map(|label| {
                    best_for_outcome(&snapshot.quotes, label).map(|(odd, quote)| {
                        BestOdd {
                            outcome_label: label.clone(),
                            odd,
                            bookmaker_name: quote.bookmaker_name.clone(),
                        }
                    })
                })
                .collect();
            (best, missing)
        }
        Err(_) => (Vec::new(), snapshot.outcome_labels.to_vec()),
    };

    let implied_sum = if missing.is_empty() {
        implied_probability_sum(best_odds.iter().map(|l| l.odd))
    } else {
        None
    };

    Diagnosis {
        event_id: snapshot.info.event_id.clone(),
        best_odds,
        missing,
        implied_sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::{EventInfo, OddsQuote};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn snapshot(id: &str, labels: &[&str], quotes: Vec<OddsQuote>) -> EventOddsSnapshot {
        let info = EventInfo {
            event_id: id.to_string(),
            description: format!("{id} match"),
            sport: "Football".to_string(),
            league: "League".to_string(),
            starts_at: None,
        };
        EventOddsSnapshot::new(info, labels.iter().copied(), quotes).unwrap()
    }

    fn arb_event(id: &str) -> EventOddsSnapshot {
        snapshot(
            id,
            &["Home", "Away"],
            vec![
                OddsQuote::new("a", "BookA", [("Home", dec!(2.10)), ("Away", dec!(1.95))]),
                OddsQuote::new("b", "BookB", [("Home", dec!(2.05)), ("Away", dec!(2.00))]),
            ],
        )
    }

    fn flat_event(id: &str) -> EventOddsSnapshot {
        snapshot(
            id,
            &["Home", "Draw", "Away"],
            vec![OddsQuote::new(
                "a",
                "BookA",
                [("Home", dec!(2.0)), ("Draw", dec!(3.0)), ("Away", dec!(4.0))],
            )],
        )
    }

    fn incomplete_event(id: &str) -> EventOddsSnapshot {
        snapshot(
            id,
            &["Home", "Away"],
            vec![OddsQuote::new("a", "BookA", [("Home", dec!(0)), ("Away", dec!(2.5))])],
        )
    }

    #[test]
    fn scan_collects_in_input_order() {
        let snapshots = vec![
            arb_event("e1"),
            flat_event("e2"),
            incomplete_event("e3"),
            arb_event("e4"),
        ];

        let report = scan(&snapshots, dec!(100)).unwrap();

        assert_eq!(report.events_scanned, 4);
        assert_eq!(report.no_arbitrage, 1);
        assert_eq!(report.incomplete, 1);
        let ids: Vec<&str> = report.opportunities.iter().map(|o| o.event_id()).collect();
        assert_eq!(ids, vec!["e1", "e4"]);
        assert_eq!(report.opportunities[0].event.description, "e1 match");
    }

    #[test]
    fn parallel_scan_matches_sequential() {
        let snapshots: Vec<_> = (0..64)
            .map(|i| match i % 3 {
                0 => arb_event(&format!("e{i}")),
                1 => flat_event(&format!("e{i}")),
                _ => incomplete_event(&format!("e{i}")),
            })
            .collect();

        let sequential = scan(&snapshots, dec!(100)).unwrap();
        let parallel = scan_parallel(&snapshots, dec!(100)).unwrap();

        let ids = |r: &ScanReport| -> Vec<String> {
            r.opportunities.iter().map(|o| o.event_id().to_string()).collect()
        };
        assert_eq!(ids(&sequential), ids(&parallel));
        assert_eq!(sequential.incomplete, parallel.incomplete);
        assert_eq!(sequential.no_arbitrage, parallel.no_arbitrage);
    }

    #[test]
    fn scan_rejects_invalid_investment() {
        assert_eq!(
            scan(&[arb_event("e1")], dec!(-5)),
            Err(ArbitrageError::InvalidInvestment(dec!(-5)))
        );
    }

    #[test]
    fn overflowing_investment_is_counted_not_fatal() {
        let report = scan(&[arb_event("e1"), flat_event("e2")], Decimal::MAX).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.no_arbitrage, 1);
        assert!(report.opportunities.is_empty());
    }

    #[test]
    fn scan_records_skips_malformed() {
        let records = vec![
            json!({
                "event_id": "ok",
                "bookmakers": [
                    {"id": "a", "name": "BookA", "odds": {"Home": 2.10, "Away": 1.95}},
                    {"id": "b", "name": "BookB", "odds": {"Home": "2,05", "Away": "2,00"}}
                ]
            }),
            json!("not a record"),
            json!({"event_id": "empty", "bookmakers": []}),
            json!({"_id": "row", "odd_1": "abc", "odd_2": "2.0"}),
            json!({"_id": "row2", "odd_1": "2.2", "odd_2": "2.1", "bookmaker_1": "X", "bookmaker_2": "Y"}),
        ];

        let report = scan_records(&records, dec!(100), false).unwrap();

        assert_eq!(report.malformed, 3);
        assert_eq!(report.events_scanned, 2);
        let ids: Vec<&str> = report.opportunities.iter().map(|o| o.event_id()).collect();
        assert_eq!(ids, vec!["ok", "row2"]);
    }

    #[test]
    fn normalize_feed_counts_rejected_documents() {
        let good: RawEventRecord = serde_json::from_value(json!({
            "event_id": "good",
            "bookmakers": [{"id": "a", "name": "BookA", "odds": {"Home": 2.1, "Away": 2.0}}]
        }))
        .unwrap();
        let empty: RawEventRecord =
            serde_json::from_value(json!({"event_id": "empty", "bookmakers": []})).unwrap();

        let (snapshots, malformed) = normalize_feed(vec![empty, good]);

        assert_eq!(malformed, 1);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].event_id(), "good");
    }

    #[test]
    fn threshold_filter() {
        let report = scan(&[arb_event("e1")], dec!(100)).unwrap();

        assert_eq!(report.above_threshold(dec!(2)).len(), 1);
        assert!(report.above_threshold(dec!(3)).is_empty());
    }

    #[test]
    fn diagnose_reports_sum_and_missing() {
        let flat = diagnose(&flat_event("e2"));
        assert_eq!(flat.best_odds.len(), 3);
        assert!(flat.gap().unwrap() > Decimal::ZERO);
        assert!(flat.to_string().contains("Draw=3.0@BookA"));

        let partial = diagnose(&incomplete_event("e3"));
        assert_eq!(partial.missing, vec!["Home".to_string()]);
        assert_eq!(partial.best_odds.len(), 1);
        assert_eq!(partial.implied_sum, None);
        assert!(partial.to_string().contains("missing=Home"));
    }
}
