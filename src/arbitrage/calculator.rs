//! Implied probabilities and payout-equalizing stake allocation.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::error::ArbitrageError;
use crate::odds::{BestOddsSelection, EventInfo, Legs, MarketType};

/// Margin below 1 the implied-probability sum must clear.
///
/// Sums in `[1 - ARBITRAGE_EPSILON, 1)` are reported as no opportunity.
pub const ARBITRAGE_EPSILON: Decimal = dec!(0.000000001);

/// Stake placed on one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeAllocation {
    /// Bookmaker to place the stake with.
    pub bookmaker_name: String,
    /// Outcome backed.
    pub outcome_label: String,
    /// Decimal odd taken.
    pub odd: Decimal,
    /// Amount to stake.
    pub stake_amount: Decimal,
    /// Payout if this outcome wins (stake * odd).
    pub guaranteed_individual_return: Decimal,
}

/// Detected sure bet with its full staking plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    /// Event descriptors.
    #[serde(flatten)]
    pub event: EventInfo,
    /// 2-way or 3-way.
    pub market_type: MarketType,
    /// Sum of 1/odd over all legs (< 1).
    pub implied_probability_sum: Decimal,
    /// Guaranteed margin: (1 - sum) * 100.
    pub profit_percentage: Decimal,
    /// Investment the plan was sized for.
    pub total_investment_requested: Decimal,
    /// Sum of stakes actually allocated.
    pub total_stake_computed: Decimal,
    /// Payout whichever outcome wins.
    pub guaranteed_return: Decimal,
    /// One allocation per outcome, in outcome order.
    pub allocations: Legs<StakeAllocation>,
    /// When the opportunity was computed.
    #[serde(with = "time::serde::rfc3339")]
    pub discovered_at: OffsetDateTime,
}

impl ArbitrageOpportunity {
    /// Event identifier.
    pub fn event_id(&self) -> &str {
        &self.event.event_id
    }

    /// Absolute profit: guaranteed return minus total stake.
    pub fn expected_profit(&self) -> Decimal {
        self.guaranteed_return - self.total_stake_computed
    }

    /// Return on the staked amount, in percent.
    pub fn roi(&self) -> Decimal {
        if self.total_stake_computed.is_zero() {
            Decimal::ZERO
        } else {
            (self.expected_profit() / self.total_stake_computed) * Decimal::ONE_HUNDRED
        }
    }

    /// Spread between the largest and smallest individual payout.
    pub fn max_payout_deviation(&self) -> Decimal {
        let returns = self.allocations.iter().map(|a| a.guaranteed_individual_return);
        match (returns.clone().max(), returns.min()) {
            (Some(max), Some(min)) => max - min,
            _ => Decimal::ZERO,
        }
    }

    /// Allocations with stakes rounded to `dp` decimal places.
    ///
    /// Returns are recomputed from the rounded stakes, so they may no longer
    /// be exactly equal.
    pub fn rounded_allocations(&self, dp: u32) -> Legs<StakeAllocation> {
        self.allocations
            .iter()
            .map(|a| {
                let stake = a
                    .stake_amount
                    .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
                StakeAllocation {
                    stake_amount: stake,
                    guaranteed_individual_return: (stake * a.odd)
                        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
                    ..a.clone()
                }
            })
            .collect()
    }
}

/// Implied probability of a decimal odd.
///
/// `None` stands for an unbounded probability (odd <= 0).
pub fn implied_probability(odd: Decimal) -> Option<Decimal> {
    if odd <= Decimal::ZERO {
        return None;
    }
    Decimal::ONE.checked_div(odd)
}

/// Sum of implied probabilities; `None` if any term is unbounded.
pub fn implied_probability_sum<I>(odds: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    odds.into_iter().try_fold(Decimal::ZERO, |acc, odd| {
        implied_probability(odd).and_then(|p| acc.checked_add(p))
    })
}

/// Whether an implied-probability sum leaves a risk-free margin.
pub fn is_arbitrage(sum: Decimal) -> bool {
    sum < Decimal::ONE - ARBITRAGE_EPSILON
}

/// Evaluate a best-odds selection for arbitrage.
///
/// Returns `Ok(None)` when the odds leave no margin. Stakes are sized so that
/// every outcome pays `total_investment / sum`.
#[instrument(skip(selection), fields(event = %selection.event.event_id, market = %market_type))]
pub fn evaluate(
    selection: &BestOddsSelection,
    market_type: MarketType,
    total_investment: Decimal,
) -> Result<Option<ArbitrageOpportunity>, ArbitrageError> {
    if total_investment <= Decimal::ZERO {
        return Err(ArbitrageError::InvalidInvestment(total_investment));
    }

    if selection.legs.len() != market_type.outcome_count() {
        return Err(ArbitrageError::OutcomeCountMismatch {
            expected: market_type.outcome_count(),
            actual: selection.legs.len(),
        });
    }

    let Some(sum) = implied_probability_sum(selection.odds()) else {
        debug!("Unbounded implied probability");
        return Ok(None);
    };

    if !is_arbitrage(sum) {
        debug!(implied_sum = %sum, "No arbitrage");
        return Ok(None);
    }

    let overflow = || ArbitrageError::Overflow {
        investment: total_investment,
    };

    let guaranteed_return = total_investment.checked_div(sum).ok_or_else(overflow)?;

    let mut allocations = Legs::new();
    let mut total_stake = Decimal::ZERO;

    for leg in &selection.legs {
        let stake = guaranteed_return.checked_div(leg.odd).ok_or_else(overflow)?;
        let payout = stake.checked_mul(leg.odd).ok_or_else(overflow)?;
        total_stake = total_stake.checked_add(stake).ok_or_else(overflow)?;

        allocations.push(StakeAllocation {
            bookmaker_name: leg.bookmaker_name.clone(),
            outcome_label: leg.outcome_label.clone(),
            odd: leg.odd,
            stake_amount: stake,
            guaranteed_individual_return: payout,
        });
    }

    Ok(Some(ArbitrageOpportunity {
        event: selection.event.clone(),
        market_type,
        implied_probability_sum: sum,
        profit_percentage: (Decimal::ONE - sum) * Decimal::ONE_HUNDRED,
        total_investment_requested: total_investment,
        total_stake_computed: total_stake,
        guaranteed_return,
        allocations,
        discovered_at: OffsetDateTime::now_utc(),
    }))
}
