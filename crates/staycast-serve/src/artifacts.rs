//! Serving artifacts and their atomic slot.

use crate::error::{GatewayError, LoadError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use staycast_features::{CATEGORICAL_COLUMNS, LabelStore, feature_names};
use staycast_model::{Lineage, LinearModel, PriceModel};
use staycast_season::SeasonIndex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info};

/// Gateway configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Year every request date is normalized onto. Must equal the year the
    /// season index was built for.
    pub canonical_year: i32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            canonical_year: 2025,
        }
    }
}

/// File names inside an artifact directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl ArtifactLayout {
    /// Season index file name
    pub const SEASONS: &'static str = "seasons.json";
    /// Label store file name
    pub const LABELS: &'static str = "labels.json";
    /// Model file name
    pub const MODEL: &'static str = "model.json";
    /// Training matrix file name
    pub const MATRIX: &'static str = "training_matrix.csv";

    /// Layout rooted at `dir`.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `seasons.json`.
    pub fn seasons(&self) -> PathBuf {
        self.dir.join(Self::SEASONS)
    }

    /// Path of `labels.json`.
    pub fn labels(&self) -> PathBuf {
        self.dir.join(Self::LABELS)
    }

    /// Path of `model.json`.
    pub fn model(&self) -> PathBuf {
        self.dir.join(Self::MODEL)
    }

    /// Path of `training_matrix.csv`.
    pub fn matrix(&self) -> PathBuf {
        self.dir.join(Self::MATRIX)
    }
}

/// Fingerprint of a season index and label store, as stored in a model.
pub fn lineage(seasons: &SeasonIndex, labels: &LabelStore) -> Lineage {
    let year = seasons.canonical_year();
    let days = NaiveDate::from_ymd_opt(year, 1, 1)
        .into_iter()
        .flat_map(|first| first.iter_days())
        .take_while(|day| day.year() == year);

    Lineage {
        canonical_year: year,
        seasons: days
            .map(|day| {
                seasons
                    .get(day)
                    .map_or('-', |season| char::from(b'0' + season.code()))
            })
            .collect(),
        vocabularies: labels
            .columns()
            .filter_map(|column| {
                let classes = labels.vocabulary(column)?.classes();
                Some((
                    column.to_string(),
                    classes.into_iter().map(str::to_string).collect(),
                ))
            })
            .collect(),
    }
}

/// Everything a prediction needs, frozen after load.
#[derive(Debug, Clone)]
pub struct ServingArtifacts {
    config: GatewayConfig,
    seasons: SeasonIndex,
    labels: LabelStore,
    model: Arc<dyn PriceModel>,
}

impl ServingArtifacts {
    /// Bundle artifacts after checking they agree.
    ///
    /// # Errors
    ///
    /// [`LoadError::Inconsistent`] when
    /// - the season index was built for a different year than configured
    /// - some day of that year has no season
    /// - a categorical column has no vocabulary
    /// - the model expects different features
    /// - the model was trained against another season index or vocabulary
    pub fn new(
        config: GatewayConfig,
        seasons: SeasonIndex,
        labels: LabelStore,
        model: Arc<dyn PriceModel>,
    ) -> Result<Self, LoadError> {
        if seasons.canonical_year() != config.canonical_year {
            return Err(LoadError::Inconsistent(format!(
                "season index built for {}, gateway configured for {}",
                seasons.canonical_year(),
                config.canonical_year
            )));
        }
        let gaps = seasons.coverage_gaps(config.canonical_year);
        if let Some(first) = gaps.first() {
            return Err(LoadError::Inconsistent(format!(
                "season index is missing {} days of {}, first {first}",
                gaps.len(),
                config.canonical_year
            )));
        }
        for column in CATEGORICAL_COLUMNS {
            if labels.vocabulary(column.name()).is_none() {
                return Err(LoadError::Inconsistent(format!(
                    "label store has no vocabulary for {column}"
                )));
            }
        }
        let expected = feature_names();
        if model.feature_names() != expected.as_slice() {
            return Err(LoadError::Inconsistent(format!(
                "model features {:?} differ from {expected:?}",
                model.feature_names()
            )));
        }
        let built = lineage(&seasons, &labels);
        match model.lineage() {
            None => {
                return Err(LoadError::Inconsistent(
                    "model carries no preprocessing lineage".to_string(),
                ));
            }
            Some(trained) => {
                if let Some(difference) = trained.difference(&built) {
                    return Err(LoadError::Inconsistent(format!(
                        "model was trained against other artifacts: {difference}"
                    )));
                }
            }
        }

        Ok(Self {
            config,
            seasons,
            labels,
            model,
        })
    }

    /// Load all artifacts from a directory.
    pub fn load(layout: &ArtifactLayout, config: GatewayConfig) -> Result<Self, LoadError> {
        let seasons = SeasonIndex::load(layout.seasons())?;
        let labels = LabelStore::load(layout.labels())?;
        let model = LinearModel::load(layout.model(), feature_names().as_slice())?;

        let artifacts = Self::new(config, seasons, labels, Arc::new(model))?;
        info!(
            dir = %layout.dir().display(),
            seasons = artifacts.seasons.len(),
            canonical_year = config.canonical_year,
            "loaded serving artifacts"
        );
        Ok(artifacts)
    }

    /// Gateway configuration.
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Season index.
    pub const fn seasons(&self) -> &SeasonIndex {
        &self.seasons
    }

    /// Label store.
    pub const fn labels(&self) -> &LabelStore {
        &self.labels
    }

    /// Price model.
    pub fn model(&self) -> &dyn PriceModel {
        self.model.as_ref()
    }
}

type SlotState = Result<Arc<ServingArtifacts>, String>;

/// Holder of the live artifact bundle.
///
/// Readers clone an `Arc` to the current bundle and never observe a partial
/// update. A load failure is kept in place of a bundle.
#[derive(Debug)]
pub struct ArtifactSlot {
    state: RwLock<SlotState>,
}

impl ArtifactSlot {
    /// Slot holding `artifacts`.
    pub fn new(artifacts: ServingArtifacts) -> Self {
        Self {
            state: RwLock::new(Ok(Arc::new(artifacts))),
        }
    }

    /// Slot with no artifacts, answering every request as unavailable.
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self {
            state: RwLock::new(Err(reason.into())),
        }
    }

    /// Load from a directory, capturing any failure instead of returning it.
    pub fn load(layout: &ArtifactLayout, config: GatewayConfig) -> Self {
        match ServingArtifacts::load(layout, config) {
            Ok(artifacts) => Self::new(artifacts),
            Err(e) => {
                error!(error = %e, dir = %layout.dir().display(), "failed to load artifacts");
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Current bundle.
    pub fn current(&self) -> Result<Arc<ServingArtifacts>, GatewayError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .as_ref()
            .map(Arc::clone)
            .map_err(|_| GatewayError::ModelUnavailable)
    }

    /// Why the slot is empty, if it is.
    pub fn failure(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.as_ref().err().cloned()
    }

    /// Replace the bundle.
    pub fn replace(&self, artifacts: ServingArtifacts) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Ok(Arc::new(artifacts));
    }

    /// Load a new bundle and swap it in.
    ///
    /// On failure the previous state is kept untouched.
    pub fn reload(&self, layout: &ArtifactLayout, config: GatewayConfig) -> Result<(), LoadError> {
        let artifacts = ServingArtifacts::load(layout, config)?;
        self.replace(artifacts);
        info!(dir = %layout.dir().display(), "reloaded serving artifacts");
        Ok(())
    }
}
