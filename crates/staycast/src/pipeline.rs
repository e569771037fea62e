//! Offline pipeline: calendar aggregation, feature building and training.
//!
//! Stages run in memory. Artifacts are written only once every requested
//! stage has succeeded, each file atomically. A model always records the
//! season index and vocabularies it was fit against, and a build that
//! replaces those removes the model that no longer matches them.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use staycast_data::artifact::{read_json, remove_artifact};
use staycast_data::{CalendarRecord, ListingAttributes, load_calendar, load_listings};
use staycast_features::{FeatureBuild, FeatureBuilder, FeatureConfig, TrainingSet, feature_names};
use staycast_model::{
    FitReport, Lineage, LinearModel, PriceModel, SgdConfig, SgdRegressor, TargetTransform,
};
use staycast_season::{CalendarAggregator, SeasonConfig, SeasonReport, normalize};
use staycast_serve::{ArtifactLayout, GatewayConfig, lineage};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings for every offline stage and the gateway that serves the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path of `calendar.csv`
    pub calendar: PathBuf,
    /// Path of `listings.csv`
    pub listings: PathBuf,
    /// Artifact directory, if not chosen by the caller
    pub artifacts: Option<PathBuf>,
    /// Calendar aggregation
    pub season: SeasonConfig,
    /// Feature building
    pub features: FeatureConfig,
    /// Regressor
    pub sgd: SgdConfig,
    /// Transform applied to the target before fitting
    pub target: TargetTransform,
    /// Serving
    pub gateway: GatewayConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            calendar: PathBuf::from("calendar.csv"),
            listings: PathBuf::from("listings.csv"),
            artifacts: None,
            season: SeasonConfig::default(),
            features: FeatureConfig::default(),
            sgd: SgdConfig::default(),
            target: TargetTransform::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(read_json(path)?)
    }
}

/// Season report and training matrix of one build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Calendar aggregation result
    pub season: SeasonReport,
    /// Matrix and label store
    pub features: FeatureBuild,
}

impl BuildOutput {
    /// Fingerprint a model trained on this build must carry.
    pub fn lineage(&self) -> Lineage {
        lineage(&self.season.index, &self.features.labels)
    }

    /// Write `seasons.json`, `labels.json` and `training_matrix.csv`.
    ///
    /// Any `model.json` already in the directory was trained against the
    /// artifacts being replaced, so it is deleted first.
    pub fn persist(&self, layout: &ArtifactLayout) -> Result<()> {
        if remove_artifact(layout.model())? {
            warn!(
                path = %layout.model().display(),
                "removed model trained on replaced artifacts"
            );
        }

        self.season.index.save(layout.seasons())?;
        self.features.labels.save(layout.labels())?;
        self.features.matrix.write_csv(layout.matrix())?;

        info!(dir = %layout.dir().display(), "wrote build artifacts");
        Ok(())
    }
}

/// A build followed by training.
#[derive(Debug)]
pub struct PipelineRun {
    /// Build stage output
    pub output: BuildOutput,
    /// Fitted model
    pub model: LinearModel,
    /// In-sample fit quality
    pub report: FitReport,
}

/// Runs the offline stages.
#[derive(Debug, Clone)]
pub struct OfflinePipeline {
    config: PipelineConfig,
    aggregator: CalendarAggregator,
    builder: FeatureBuilder,
}

impl OfflinePipeline {
    /// Create a pipeline after checking that stages agree.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] when the season and gateway canonical years
    /// differ or the season and feature cutoffs differ. Invalid stage
    /// parameters surface as the stage's own error.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        if config.season.canonical_year != config.gateway.canonical_year {
            return Err(PipelineError::Config(format!(
                "season canonical_year {} differs from gateway canonical_year {}",
                config.season.canonical_year, config.gateway.canonical_year
            )));
        }
        if config.season.cutoff_year != config.features.cutoff_year {
            return Err(PipelineError::Config(format!(
                "season cutoff_year {} differs from features cutoff_year {}",
                config.season.cutoff_year, config.features.cutoff_year
            )));
        }
        SgdRegressor::new(config.sgd.clone())?;

        let aggregator = CalendarAggregator::new(config.season.clone())?;
        let builder = FeatureBuilder::new(config.features);

        Ok(Self {
            config,
            aggregator,
            builder,
        })
    }

    /// Create a pipeline with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not happen).
    pub fn try_default() -> Result<Self> {
        Self::new(PipelineConfig::default())
    }

    /// Get the current configuration
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read listings and cleaned calendar records from the configured paths.
    pub fn load_inputs(&self) -> Result<(Vec<ListingAttributes>, Vec<CalendarRecord>)> {
        let listings = load_listings(&self.config.listings)?;
        let calendar = normalize(&load_calendar(&self.config.calendar)?)?;
        info!(
            listings = listings.len(),
            calendar = calendar.len(),
            "loaded inputs"
        );
        Ok((listings, calendar))
    }

    /// Derive the season index.
    pub fn seasons(&self, calendar: &[CalendarRecord]) -> Result<SeasonReport> {
        Ok(self.aggregator.run(calendar)?)
    }

    /// Build the training matrix against a season index.
    pub fn features(
        &self,
        listings: &[ListingAttributes],
        calendar: &[CalendarRecord],
        season: &SeasonReport,
    ) -> Result<FeatureBuild> {
        Ok(self.builder.build(listings, calendar, &season.index)?)
    }

    /// Fit a fresh model on the labelled rows of `set`.
    ///
    /// `lineage` identifies the season index and vocabularies the matrix
    /// was encoded with and is stored in the model.
    pub fn train(
        &self,
        set: &TrainingSet,
        lineage: Lineage,
    ) -> Result<(LinearModel, FitReport)> {
        let (x, prices) = set.labelled();
        let mut model = LinearModel::new(
            feature_names().as_slice(),
            self.config.sgd.clone(),
            self.config.target,
        )?
        .with_lineage(lineage);
        let report = model.fit(&x, &prices)?;
        Ok((model, report))
    }

    /// Run aggregation and feature building on in-memory inputs.
    pub fn build_from(
        &self,
        listings: &[ListingAttributes],
        calendar: &[CalendarRecord],
    ) -> Result<BuildOutput> {
        let season = self.seasons(calendar)?;
        let features = self.features(listings, calendar, &season)?;
        Ok(BuildOutput { season, features })
    }

    /// Load inputs, then aggregate and build.
    pub fn build(&self) -> Result<BuildOutput> {
        let (listings, calendar) = self.load_inputs()?;
        self.build_from(&listings, &calendar)
    }

    /// Build, train, and persist all four artifacts.
    pub fn run(&self, layout: &ArtifactLayout) -> Result<PipelineRun> {
        let output = self.build()?;
        let set = output.features.matrix.training_set()?;
        let (model, report) = self.train(&set, output.lineage())?;

        output.persist(layout)?;
        model.save(layout.model())?;

        info!(
            rows = report.rows,
            rmse = report.rmse,
            r2 = report.r2,
            dir = %layout.dir().display(),
            "pipeline complete"
        );
        Ok(PipelineRun {
            output,
            model,
            report,
        })
    }
}
