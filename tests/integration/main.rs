//! End-to-end tests: snapshot files and the simulated feed through a full scan.

use std::io::Write;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;

use surebet_scan::arbitrage::{scan, scan_file, scan_records};
use surebet_scan::error::{ArbitrageError, FeedError};
use surebet_scan::feed::{load_records, save_records, OddsSimulator};
use surebet_scan::odds::{MarketType, RawRecord};
use surebet_scan::ScanError;

fn write_snapshot(value: serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

fn two_book_event() -> serde_json::Value {
    json!({
        "event_id": "evt_a",
        "description": "Home FC vs Away FC",
        "sport": "Football",
        "league": "Test League",
        "bookmakers": [
            {"id": "a", "name": "BookA", "odds": {"Home": 2.10, "Away": 1.95}},
            {"id": "b", "name": "BookB", "odds": {"Home": 2.05, "Away": 2.00}}
        ]
    })
}

#[test]
fn snapshot_file_two_way_opportunity() {
    let file = write_snapshot(json!([two_book_event()]));

    let report = scan_file(file.path(), dec!(100), false).unwrap();

    assert_eq!(report.events_scanned, 1);
    assert_eq!(report.opportunities.len(), 1);

    let opp = &report.opportunities[0];
    assert_eq!(opp.event_id(), "evt_a");
    assert_eq!(opp.market_type, MarketType::TwoWay);
    assert_eq!(opp.profit_percentage.round_dp(2), dec!(2.38));
    assert_eq!(opp.guaranteed_return.round_dp(2), dec!(102.44));

    let legs = opp.rounded_allocations(2);
    assert_eq!(legs[0].outcome_label, "Home");
    assert_eq!(legs[0].bookmaker_name, "BookA");
    assert_eq!(legs[0].stake_amount, dec!(48.78));
    assert_eq!(legs[1].outcome_label, "Away");
    assert_eq!(legs[1].bookmaker_name, "BookB");
    assert_eq!(legs[1].stake_amount, dec!(51.22));
}

#[test]
fn mixed_snapshot_counts_every_skip_reason() {
    let file = write_snapshot(json!([
        two_book_event(),
        {
            "_id": {"$oid": "row-ok"},
            "teams": "Lakers x Warriors",
            "line": "Lakers/Warriors",
            "odd_1": "2,10",
            "odd_2": "2,00",
            "bookmaker_1": "BookA",
            "bookmaker_2": "BookB"
        },
        {
            "_id": "row-bad",
            "odd_1": "2,10",
            "odd_2": "abc",
            "bookmaker_1": "BookA",
            "bookmaker_2": "BookB"
        },
        42,
        {"event_id": "evt_empty", "bookmakers": []},
        {
            "event_id": "evt_fair",
            "bookmakers": [
                {"id": "a", "name": "BookA", "odds": {"Home": 2.00, "Draw": 3.00, "Away": 4.00}}
            ]
        },
        {
            "event_id": "evt_hole",
            "bookmakers": [
                {"id": "a", "name": "BookA", "odds": {"Home": 2.5, "Away": 0}},
                {"id": "b", "name": "BookB", "odds": {"Home": 2.4, "Away": "0,0"}}
            ]
        }
    ]));

    let report = scan_file(file.path(), dec!(100), false).unwrap();

    assert_eq!(report.malformed, 3);
    assert_eq!(report.events_scanned, 4);
    assert_eq!(report.no_arbitrage, 1);
    assert_eq!(report.incomplete, 1);
    assert_eq!(report.failed, 0);

    let ids: Vec<&str> = report.opportunities.iter().map(|o| o.event_id()).collect();
    assert_eq!(ids, vec!["evt_a", "row-ok"]);
}

#[test]
fn invalid_investment_rejects_the_batch() {
    let file = write_snapshot(json!([two_book_event()]));

    assert!(matches!(
        scan_file(file.path(), dec!(-5), false),
        Err(ScanError::Arbitrage(ArbitrageError::InvalidInvestment(_)))
    ));
}

#[test]
fn missing_snapshot_is_a_feed_error() {
    assert!(matches!(
        scan_file("/no/such/snapshot.json", dec!(100), false),
        Err(ScanError::Feed(FeedError::Read { .. }))
    ));
}

#[test]
fn simulated_snapshot_round_trips_through_a_file() {
    let records = OddsSimulator::seeded(11)
        .with_boost_probability(1.0)
        .fetch(None)
        .unwrap();

    let direct: Vec<_> = records
        .iter()
        .cloned()
        .map(|r| r.into_snapshot().unwrap())
        .collect();
    let expected = scan(&direct, dec!(250)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odds.json");
    let raw: Vec<RawRecord> = records.into_iter().map(RawRecord::Event).collect();
    save_records(&path, &raw).unwrap();

    let loaded = load_records(&path).unwrap();
    assert_eq!(loaded.len(), raw.len());

    for parallel in [false, true] {
        let report = scan_records(&loaded, dec!(250), parallel).unwrap();

        assert_eq!(report.malformed, 0);
        assert_eq!(report.events_scanned, expected.events_scanned);
        assert_eq!(report.opportunities.len(), expected.opportunities.len());
        for (got, want) in report.opportunities.iter().zip(&expected.opportunities) {
            assert_eq!(got.event_id(), want.event_id());
            assert_eq!(got.allocations, want.allocations);
            assert_eq!(got.guaranteed_return, want.guaranteed_return);
        }
    }
}

#[test]
fn opportunity_serializes_with_flat_event_fields() {
    let file = write_snapshot(json!([two_book_event()]));
    let report = scan_file(file.path(), dec!(100), false).unwrap();

    let value = serde_json::to_value(&report.opportunities[0]).unwrap();

    assert_eq!(value["event_id"], "evt_a");
    assert_eq!(value["description"], "Home FC vs Away FC");
    assert_eq!(value["market_type"], "2-way");
    assert_eq!(value["allocations"].as_array().unwrap().len(), 2);
    assert!(value["discovered_at"].is_string());
}
