//! Simulated live-odds feed.
//!
//! Serves a fixed roster of events quoted by a random subset of bookmakers,
//! occasionally inflating one price so that sure bets show up.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::FeedError;
use crate::odds::{RawBookmakerOdds, RawEventRecord};

/// Bookmaker served by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookmaker {
    /// Identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
}

/// Event served by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedEvent {
    /// Identifier.
    pub event_id: &'static str,
    /// Sport.
    pub sport: &'static str,
    /// League.
    pub league: &'static str,
    /// Description.
    pub description: &'static str,
    /// Start time (RFC 3339).
    pub starts_at: &'static str,
    /// Outcome labels with the `(low, width)` range odds are drawn from.
    pub outcomes: &'static [(&'static str, f64, f64)],
}

/// Simulated bookmakers.
pub const BOOKMAKERS: [Bookmaker; 4] = [
    Bookmaker { id: "house_alpha", name: "AlphaBet" },
    Bookmaker { id: "house_beta", name: "BetaWin" },
    Bookmaker { id: "house_gamma", name: "GammaSpins" },
    Bookmaker { id: "house_delta", name: "DeltaOdds" },
];

/// Simulated events.
pub const EVENTS: [SimulatedEvent; 4] = [
    SimulatedEvent {
        event_id: "evt_fut_001",
        sport: "Football",
        league: "Brazilian Serie A",
        description: "Corinthians vs Palmeiras",
        starts_at: "2025-05-20T19:00:00Z",
        outcomes: &[
            ("Corinthians Win", 1.8, 1.5),
            ("Draw", 2.8, 1.0),
            ("Palmeiras Win", 2.0, 1.8),
        ],
    },
    SimulatedEvent {
        event_id: "evt_fut_002",
        sport: "Football",
        league: "Champions League - Final",
        description: "Real Madrid vs Manchester City",
        starts_at: "2025-05-28T20:00:00Z",
        outcomes: &[
            ("Real Madrid Win", 1.8, 1.5),
            ("Draw", 2.8, 1.0),
            ("Manchester City Win", 2.0, 1.8),
        ],
    },
    SimulatedEvent {
        event_id: "evt_bas_001",
        sport: "Basketball",
        league: "NBA - Playoffs",
        description: "Los Angeles Lakers vs Golden State Warriors",
        starts_at: "2025-05-22T21:30:00Z",
        outcomes: &[("Lakers Win", 1.5, 0.8), ("Warriors Win", 1.6, 0.9)],
    },
    SimulatedEvent {
        event_id: "evt_ten_001",
        sport: "Tennis",
        league: "Roland Garros - Men's Final",
        description: "Player A vs Player B",
        starts_at: "2025-06-08T14:00:00Z",
        outcomes: &[("Player A Win", 1.5, 0.8), ("Player B Win", 1.6, 0.9)],
    },
];

/// Chance that one outcome of a quote gets an inflated price.
pub const DEFAULT_BOOST_PROBABILITY: f64 = 0.1;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Random odds generator standing in for a live odds API.
#[derive(Debug, Clone)]
pub struct OddsSimulator {
    rng: StdRng,
    boost_probability: f64,
}

impl Default for OddsSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl OddsSimulator {
    /// Simulator seeded from system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            boost_probability: DEFAULT_BOOST_PROBABILITY,
        }
    }

    /// Reproducible simulator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            boost_probability: DEFAULT_BOOST_PROBABILITY,
        }
    }

    /// Override the boost probability (clamped to `[0, 1]`).
    pub fn with_boost_probability(mut self, probability: f64) -> Self {
        self.boost_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Fetch odds for every event, or for a single event id.
    pub fn fetch(&mut self, event_id: Option<&str>) -> Result<Vec<RawEventRecord>, FeedError> {
        let events: Vec<&SimulatedEvent> = match event_id {
            Some(id) => {
                let event = EVENTS
                    .iter()
                    .find(|e| e.event_id == id)
                    .ok_or_else(|| FeedError::UnknownEvent(id.to_string()))?;
                vec![event]
            }
            None => EVENTS.iter().collect(),
        };

        let records: Vec<RawEventRecord> = events.into_iter().map(|e| self.quote_event(e)).collect();
        debug!(events = records.len(), "Simulated odds fetched");
        Ok(records)
    }

    fn quote_event(&mut self, event: &SimulatedEvent) -> RawEventRecord {
        let count = self.rng.gen_range(2..=BOOKMAKERS.len());
        let houses: Vec<Bookmaker> = BOOKMAKERS
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect();

        let bookmakers = houses
            .into_iter()
            .map(|house| RawBookmakerOdds {
                id: house.id.to_string(),
                name: house.name.to_string(),
                odds: self.draw_odds(event),
            })
            .collect();

        RawEventRecord {
            event_id: event.event_id.to_string(),
            description: event.description.to_string(),
            sport: event.sport.to_string(),
            league: event.league.to_string(),
            starts_at: Some(event.starts_at.to_string()),
            outcomes: None,
            bookmakers,
        }
    }

    fn draw_odds(&mut self, event: &SimulatedEvent) -> Map<String, Value> {
        let mut odds: Vec<(String, f64)> = event
            .outcomes
            .iter()
            .map(|(label, low, width)| {
                (label.to_string(), round2(self.rng.gen_range(*low..=*low + *width)))
            })
            .collect();

        if self.rng.gen_bool(self.boost_probability) {
            let idx = self.rng.gen_range(0..odds.len());
            odds[idx].1 = round2(odds[idx].1 + self.rng.gen_range(0.5..=1.5));
        }

        odds.into_iter()
            .map(|(label, odd)| (label, Value::from(odd)))
            .collect()
    }
}
