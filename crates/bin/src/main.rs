//! Staycast CLI binary.
//!
//! Builds the offline artifacts, trains the price model, and serves
//! predictions from them.

mod integration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::artifacts::resolve_artifact_dir;
use integration::server::{ServerState, serve};
use serde_json::json;
use staycast::features::{LabelStore, available_columns, read_training_set};
use staycast::season::{Season, SeasonIndex};
use staycast::serve::lineage;
use staycast::{
    ArtifactLayout, ArtifactSlot, BuildOutput, Gateway, OfflinePipeline, PipelineConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "staycast")]
#[command(about = "Staycast: nightly price estimates for short-term rentals", long_about = None)]
#[command(version)]
struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory (default: platform data dir)
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive seasons and build the training matrix
    Build {
        /// Path of calendar.csv
        #[arg(long)]
        calendar: Option<PathBuf>,

        /// Path of listings.csv
        #[arg(long)]
        listings: Option<PathBuf>,

        /// Also fit the price model
        #[arg(long)]
        train: bool,
    },

    /// Fit the price model on the persisted training matrix
    Train {
        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict one nightly price
    Predict {
        /// Room type, e.g. "Entire home/apt"
        #[arg(long)]
        room_type: String,

        /// Guest capacity
        #[arg(long)]
        accommodates: f64,

        /// Bedroom count (imputed when omitted)
        #[arg(long)]
        bedrooms: Option<f64>,

        /// Bathroom count (imputed when omitted)
        #[arg(long)]
        bathrooms: Option<f64>,

        /// Bed count (imputed when omitted)
        #[arg(long)]
        beds: Option<f64>,

        /// Neighbourhood
        #[arg(long)]
        neighbourhood: String,

        /// Stay date, yyyy-mm-dd
        #[arg(long)]
        date: String,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Listen address
        #[arg(long, default_value = "0.0.0.0:5000")]
        addr: SocketAddr,
    },

    /// Show season coverage, vocabularies and the feature schema
    Inspect {
        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let layout = ArtifactLayout::new(resolve_artifact_dir(
        cli.artifacts,
        config.artifacts.clone(),
    ));

    match cli.command {
        Commands::Build {
            calendar,
            listings,
            train,
        } => {
            let mut config = config;
            if let Some(path) = calendar {
                config.calendar = path;
            }
            if let Some(path) = listings {
                config.listings = path;
            }
            build(config, &layout, train)?;
        }
        Commands::Train { seed } => {
            let mut config = config;
            if let Some(seed) = seed {
                config.sgd.seed = seed;
            }
            train(config, &layout)?;
        }
        Commands::Predict {
            room_type,
            accommodates,
            bedrooms,
            bathrooms,
            beds,
            neighbourhood,
            date,
        } => {
            let body = json!({
                "room_type": room_type,
                "accommodates": accommodates,
                "bedrooms": bedrooms,
                "bathrooms": bathrooms,
                "beds": beds,
                "neighbourhood": neighbourhood,
                "date": date,
            });
            let gateway = Gateway::new(Arc::new(ArtifactSlot::load(&layout, config.gateway)));
            let response = gateway.respond(body)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Serve { addr } => {
            let slot = Arc::new(ArtifactSlot::load(&layout, config.gateway));
            if let Some(reason) = slot.failure() {
                eprintln!(
                    "Warning: artifacts unavailable ({reason}); POST /reload once they exist"
                );
            }
            let state = ServerState::new(Gateway::new(slot), layout, config.gateway);
            serve(addr, state).await?;
        }
        Commands::Inspect { format } => {
            inspect(&layout, &format)?;
        }
    }

    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

fn build(
    config: PipelineConfig,
    layout: &ArtifactLayout,
    train: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\nCalendar: {}", config.calendar.display());
    println!("Listings: {}", config.listings.display());
    println!("Artifacts: {}\n", layout.dir().display());

    let pipeline = OfflinePipeline::new(config)?;

    let pb = spinner("Loading inputs...")?;
    let (listings, calendar) = match pipeline.load_inputs() {
        Ok(inputs) => {
            pb.finish_with_message(format!(
                "Loaded {} listings, {} calendar rows",
                inputs.0.len(),
                inputs.1.len()
            ));
            inputs
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    print!("Deriving seasons...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let season = pipeline.seasons(&calendar)?;
    let [low, medium, high] = season.index.counts();
    println!(" ✓ ({low} low, {medium} medium, {high} high)");
    println!(
        "  Thresholds: low >= {:.3}, high < {:.3}",
        season.thresholds.low_season, season.thresholds.high_season
    );

    print!("Building training matrix...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let features = pipeline.features(&listings, &calendar, &season)?;
    let stats = features.stats;
    println!(" ✓ ({} rows)", features.matrix.len());
    println!(
        "  Joined: {}, unmatched listings: {}, beyond horizon: {}, missing target: {}",
        stats.joined, stats.unmatched_listings, stats.beyond_horizon, stats.missing_target
    );

    let output = BuildOutput { season, features };
    let fitted = if train {
        let pb = spinner("Training price model...")?;
        let set = output.features.matrix.training_set()?;
        let fitted = pipeline.train(&set, output.lineage())?;
        pb.finish_with_message(format!("Trained on {} rows", fitted.1.rows));
        Some(fitted)
    } else {
        None
    };

    output.persist(layout)?;
    if let Some((model, report)) = fitted {
        model.save(layout.model())?;
        print_fit(&report);
    }
    println!("\nArtifacts written to {}", layout.dir().display());
    Ok(())
}

fn train(
    config: PipelineConfig,
    layout: &ArtifactLayout,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = OfflinePipeline::new(config)?;

    print!("Reading training matrix...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let set = read_training_set(layout.matrix())?;
    println!(" ✓ ({} rows)", set.len());

    // the matrix was encoded with the seasons and labels next to it
    let seasons = SeasonIndex::load(layout.seasons())?;
    let labels = LabelStore::load(layout.labels())?;
    let trained_on = lineage(&seasons, &labels);

    let pb = spinner("Training price model...")?;
    let (model, report) = match pipeline.train(&set, trained_on) {
        Ok(fitted) => {
            pb.finish_with_message(format!("Trained on {} rows", fitted.1.rows));
            fitted
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    model.save(layout.model())?;
    print_fit(&report);
    println!("\nModel written to {}", layout.model().display());
    Ok(())
}

fn print_fit(report: &staycast::model::FitReport) {
    println!("\nFit ({} epochs, converged: {})", report.epochs, report.converged);
    println!("  RMSE: {:.2}", report.rmse);
    println!("  R²:   {:.4}", report.r2);
}

fn inspect(layout: &ArtifactLayout, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let seasons = SeasonIndex::load(layout.seasons())?;
    let labels = LabelStore::load(layout.labels())?;
    let year = seasons.canonical_year();
    let counts = seasons.counts();
    let gaps = seasons.coverage_gaps(year);
    let columns = available_columns();

    if format == "json" {
        let output = json!({
            "canonical_year": year,
            "seasons": {
                "low": counts[Season::Low.code() as usize],
                "medium": counts[Season::Medium.code() as usize],
                "high": counts[Season::High.code() as usize],
            },
            "coverage_gaps": gaps.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "vocabularies": labels
                .columns()
                .map(|c| (c.to_string(), json!(labels.vocabulary(c).map_or(0, |v| v.len()))))
                .collect::<serde_json::Map<_, _>>(),
            "schema": columns
                .iter()
                .map(|c| json!({
                    "name": c.name,
                    "kind": format!("{:?}", c.kind),
                    "description": c.description,
                    "feature_index": c.feature_index,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\nSeasons ({year})");
    for season in [Season::Low, Season::Medium, Season::High] {
        println!("  {:<8} {:>4} days", season.label(), counts[season.code() as usize]);
    }
    if gaps.is_empty() {
        println!("  Coverage: complete");
    } else {
        println!("  Coverage gaps: {} days", gaps.len());
        for date in gaps.iter().take(10) {
            println!("    {date}");
        }
        if gaps.len() > 10 {
            println!("    ... and {} more", gaps.len() - 10);
        }
    }

    println!("\nVocabularies");
    for column in labels.columns() {
        let size = labels.vocabulary(column).map_or(0, |v| v.len());
        println!("  {column:<14} {size:>4} values");
    }

    println!("\nSchema");
    println!("  {:<15} {:<12} {:>7}  Description", "Column", "Kind", "Feature");
    for column in &columns {
        let index = column
            .feature_index
            .map_or_else(|| "-".to_string(), |i| i.to_string());
        println!(
            "  {:<15} {:<12} {:>7}  {}",
            column.name,
            format!("{:?}", column.kind),
            index,
            column.description
        );
    }
    Ok(())
}
