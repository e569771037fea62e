//! End-to-end: raw CSV files to served predictions.

use chrono::{Datelike, Duration, NaiveDate};
use serde_json::json;
use staycast::season::SeasonError;
use staycast::serve::{GatewayError, LoadError, ServingArtifacts};
use staycast::{
    ArtifactLayout, ArtifactSlot, Gateway, OfflinePipeline, PipelineConfig, PipelineError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LISTINGS: &str = "\
id,name,room_type,accommodates,bedrooms,bathrooms,beds,neighbourhood_cleansed
1,Loft,Entire home/apt,4,,,,Centro
2,Room,Private room,2,1,1,1,Retiro
3,House,Entire home/apt,6,3,2,4,Salamanca
4,Attic,Private room,1,1,1,1,Centro
";

fn calendar_csv(days: i64) -> String {
    let mut csv = String::from("listing_id,date,available,price,adjusted_price\n");
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    for offset in 0..days {
        let day = start + Duration::days(offset);
        // busier as the year goes on: fewer open listings, higher prices
        let (open, bump) = match day.month() {
            1..=4 => (4, 0.0),
            5..=8 => (2, 10.0),
            _ => (1, 20.0),
        };
        for (listing, base) in [(1, 150.0), (2, 60.0), (3, 240.0), (4, 45.0)] {
            let flag = if listing <= open { "t" } else { "f" };
            let price = base + bump;
            csv.push_str(&format!("{listing},{day},{flag},${price:.2},\n"));
        }
    }
    csv.push_str("1,2026-01-01,t,$150.00,\n");
    csv
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("staycast-pipeline-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_inputs(dir: &Path) -> PipelineConfig {
    write_inputs_with(dir, LISTINGS, 365)
}

fn write_inputs_with(dir: &Path, listings_csv: &str, days: i64) -> PipelineConfig {
    let listings = dir.join("listings.csv");
    let calendar = dir.join("calendar.csv");
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(&listings, listings_csv).unwrap();
    std::fs::write(&calendar, calendar_csv(days)).unwrap();
    PipelineConfig {
        listings,
        calendar,
        ..PipelineConfig::default()
    }
}

#[test]
fn test_run_then_serve() {
    let dir = scratch_dir("serve");
    let config = write_inputs(&dir);
    let gateway_config = config.gateway;
    let layout = ArtifactLayout::new(dir.join("artifacts"));

    let run = OfflinePipeline::new(config).unwrap().run(&layout).unwrap();
    assert_eq!(run.output.features.matrix.len(), 1460);
    assert_eq!(run.output.features.stats.beyond_horizon, 1);
    assert_eq!(run.report.rows, 1460);
    assert!(run.report.rmse.is_finite());

    for path in [layout.seasons(), layout.labels(), layout.model(), layout.matrix()] {
        assert!(path.exists(), "{} missing", path.display());
    }

    let artifacts = ServingArtifacts::load(&layout, gateway_config).unwrap();
    let gateway = Gateway::new(Arc::new(ArtifactSlot::new(artifacts)));

    let response = gateway
        .respond(json!({
            "room_type": "Entire home/apt",
            "accommodates": 4,
            "bedrooms": null,
            "bathrooms": null,
            "beds": null,
            "neighbourhood": "Centro",
            "date": "2027-01-15"
        }))
        .unwrap();
    assert!(response.price > 0.0);
    assert_eq!(response.season_label, "Low");

    // same month and day in another year lands on the same season and price
    let again = gateway
        .respond(json!({
            "room_type": "Entire home/apt",
            "accommodates": 4,
            "bedrooms": null,
            "bathrooms": null,
            "beds": null,
            "neighbourhood_cleansed": "Centro",
            "data": "2031-01-15"
        }))
        .unwrap();
    assert_eq!(again, response);

    let unknown = gateway.respond(json!({
        "room_type": "Entire home/apt",
        "accommodates": 4,
        "bedrooms": 2,
        "bathrooms": 1,
        "beds": 2,
        "neighbourhood": "Atlantis",
        "date": "2027-01-15"
    }));
    assert!(matches!(unknown, Err(GatewayError::UnknownCategory { .. })));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_runs_are_reproducible() {
    let dir = scratch_dir("repro");
    let config = write_inputs(&dir);
    let first = ArtifactLayout::new(dir.join("first"));
    let second = ArtifactLayout::new(dir.join("second"));

    let pipeline = OfflinePipeline::new(config).unwrap();
    pipeline.run(&first).unwrap();
    pipeline.run(&second).unwrap();

    for (a, b) in [
        (first.seasons(), second.seasons()),
        (first.labels(), second.labels()),
        (first.model(), second.model()),
        (first.matrix(), second.matrix()),
    ] {
        assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_failed_run_writes_nothing() {
    let dir = scratch_dir("failed");
    let mut config = write_inputs(&dir);
    config.listings = dir.join("absent.csv");
    let layout = ArtifactLayout::new(dir.join("artifacts"));

    assert!(OfflinePipeline::new(config).unwrap().run(&layout).is_err());
    assert!(!layout.dir().exists());

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_partial_year_writes_nothing() {
    let dir = scratch_dir("partial");
    let config = write_inputs_with(&dir, LISTINGS, 120);
    let layout = ArtifactLayout::new(dir.join("artifacts"));

    let err = OfflinePipeline::new(config).unwrap().run(&layout).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Season(SeasonError::IncompleteCoverage { year: 2025, .. })
    ));
    assert!(!layout.dir().exists());

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_rebuild_invalidates_trained_model() {
    let dir = scratch_dir("rebuild");
    let layout = ArtifactLayout::new(dir.join("artifacts"));
    let gateway_config = PipelineConfig::default().gateway;

    let config = write_inputs(&dir.join("a"));
    OfflinePipeline::new(config).unwrap().run(&layout).unwrap();
    let trained = std::fs::read(layout.model()).unwrap();
    assert!(ServingArtifacts::load(&layout, gateway_config).is_ok());

    // same listings, one neighbourhood renamed, rebuilt without training
    let renamed = LISTINGS.replace("Retiro", "Atocha");
    let config = write_inputs_with(&dir.join("b"), &renamed, 365);
    let output = OfflinePipeline::new(config).unwrap().build().unwrap();
    output.persist(&layout).unwrap();

    assert!(!layout.model().exists());
    assert!(ServingArtifacts::load(&layout, gateway_config).is_err());

    // putting the old model back is caught by its lineage
    std::fs::write(layout.model(), &trained).unwrap();
    let err = ServingArtifacts::load(&layout, gateway_config).unwrap_err();
    match err {
        LoadError::Inconsistent(reason) => assert!(reason.contains("neighbourhood"), "{reason}"),
        other => panic!("unexpected error: {other}"),
    }

    std::fs::remove_dir_all(dir).unwrap();
}
