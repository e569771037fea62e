//! Integration tests from raw calendar rows to a persisted season index.

use chrono::{Datelike, Duration, NaiveDate};
use staycast_data::read_calendar;
use staycast_season::{
    CalendarAggregator, Season, SeasonConfig, SeasonError, SeasonIndex, normalize,
};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

fn calendar_csv(days: i64) -> String {
    let mut csv = String::from("listing_id,date,available,price,adjusted_price\n");
    for offset in 0..days {
        let day = date(1, 1) + Duration::days(offset);
        // June 25 has no reporting listings at all
        if day == date(6, 25) {
            continue;
        }
        // January to April: all three listings open, May to August: one,
        // September onwards: none
        let open = match day.month() {
            1..=4 => 3,
            5..=8 => 1,
            _ => 0,
        };
        for listing in 1..=3 {
            let flag = if listing <= open { "t" } else { "f" };
            csv.push_str(&format!("{listing},{day},{flag},\"$1,100.00\",\n"));
        }
    }
    // next year's calendar is outside the training horizon
    csv.push_str("1,2026-01-01,t,$100.00,\n");
    csv
}

#[test]
fn test_raw_calendar_to_index() {
    let rows = read_calendar(calendar_csv(365).as_bytes()).unwrap();
    let records = normalize(&rows).unwrap();
    assert_eq!(records[0].adjusted_price, Some(1100.0));

    let aggregator = CalendarAggregator::new(SeasonConfig::default()).unwrap();
    let report = aggregator.run(&records).unwrap();

    assert_eq!(report.daily.start(), date(1, 1));
    assert_eq!(report.daily.end(), Some(date(12, 31)));
    assert_eq!(report.daily.len(), 365);
    assert_eq!(report.index.len(), 365);
    assert!(report.index.coverage_gaps(2025).is_empty());

    assert_eq!(report.index.get(date(1, 20)), Some(Season::Low));
    assert_eq!(report.index.get(date(5, 2)), Some(Season::Low));
    assert_eq!(report.index.get(date(6, 20)), Some(Season::Medium));
    assert_eq!(report.index.get(date(10, 20)), Some(Season::High));
    // the empty day still has a season
    assert_eq!(report.daily.values()[175], 0.0);
    assert_eq!(report.index.get(date(6, 25)), Some(Season::Medium));
    assert!(report.index.get(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).is_none());
}

#[test]
fn test_partial_calendar_is_rejected() {
    let rows = read_calendar(calendar_csv(90).as_bytes()).unwrap();
    let records = normalize(&rows).unwrap();

    let err = CalendarAggregator::try_default().unwrap().run(&records).unwrap_err();
    assert!(matches!(
        err,
        SeasonError::IncompleteCoverage { year: 2025, missing: 275, .. }
    ));

    let relaxed = CalendarAggregator::new(SeasonConfig {
        require_full_year: false,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(relaxed.run(&records).unwrap().index.len(), 90);
}

#[test]
fn test_index_survives_persistence() {
    let rows = read_calendar(calendar_csv(365).as_bytes()).unwrap();
    let records = normalize(&rows).unwrap();
    let report = CalendarAggregator::try_default().unwrap().run(&records).unwrap();

    let dir = std::env::temp_dir().join(format!("staycast-season-it-{}", std::process::id()));
    let path = dir.join("seasons.json");
    report.index.save(&path).unwrap();

    let loaded = SeasonIndex::load(&path).unwrap();
    assert_eq!(loaded, report.index);
    assert_eq!(loaded.canonical_year(), 2025);

    std::fs::remove_dir_all(dir).unwrap();
}
