//! Best-odd aggregation across bookmakers.

use rust_decimal::Decimal;
use tracing::instrument;

use super::types::{BestOdd, BestOddsSelection, EventOddsSnapshot, Legs, OddsQuote};
use crate::error::OddsError;

/// Whether an odd can take part in the max-odd search.
pub fn is_valid_odd(odd: Decimal) -> bool {
    odd > Decimal::ZERO
}

/// Find the highest valid odd for one outcome.
///
/// Ties keep the first quote in iteration order.
pub fn best_for_outcome<'a>(
    quotes: &'a [OddsQuote],
    outcome: &str,
) -> Option<(Decimal, &'a OddsQuote)> {
    let mut best: Option<(Decimal, &OddsQuote)> = None;

    for quote in quotes {
        let Some(odd) = quote.odd(outcome) else {
            continue;
        };
        if !is_valid_odd(odd) {
            continue;
        }

        match best {
            Some((current, _)) if odd <= current => {}
            _ => best = Some((odd, quote)),
        }
    }

    best
}

/// Select the best odd per outcome, reporting every uncovered outcome.
#[instrument(skip(snapshot), fields(event = %snapshot.info.event_id))]
pub fn aggregate(snapshot: &EventOddsSnapshot) -> Result<BestOddsSelection, OddsError> {
    let mut legs = Legs::new();
    let mut missing = Vec::new();

    for label in &snapshot.outcome_labels {
        match best_for_outcome(&snapshot.quotes, label) {
            Some((odd, quote)) => legs.push(BestOdd {
                outcome_label: label.clone(),
                odd,
                bookmaker_name: quote.bookmaker_name.clone(),
            }),
            None => missing.push(label.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(OddsError::IncompleteMarket {
            event_id: snapshot.info.event_id.clone(),
            missing,
        });
    }

    Ok(BestOddsSelection {
        event: snapshot.info.clone(),
        legs,
    })
}

/// Best odd per outcome, or `None` when any outcome is uncovered.
pub fn find_best_odds(snapshot: &EventOddsSnapshot) -> Option<BestOddsSelection> {
    aggregate(snapshot).ok()
}

/// Number of bookmakers quoting a valid odd for each outcome.
pub fn coverage(snapshot: &EventOddsSnapshot) -> Vec<(String, usize)> {
    snapshot
        .outcome_labels
        .iter()
        .map(|label| {
            let count = snapshot
                .quotes
                .iter()
                .filter(|q| q.odd(label).is_some_and(is_valid_odd))
                .count();
            (label.clone(), count)
        })
        .collect()
}
