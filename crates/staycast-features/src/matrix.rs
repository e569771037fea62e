//! Training matrix
//!
//! The in-memory matrix, its polars form, and the CSV artifact. Reading the
//! matrix back always goes through column names, never through positions.

use crate::error::FeatureError;
use crate::schema::{Column, FEATURE_COLUMNS, FEATURE_COUNT, FeatureVector, MATRIX_COLUMNS};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use polars::prelude::{
    CsvReadOptions, CsvWriter, DataFrame, DataType, NamedFrom, PlSmallStr, SerReader, SerWriter,
    Series,
};
use staycast_data::artifact::write_atomic;
use staycast_season::Season;
use std::path::Path;
use tracing::{info, warn};

/// One row of the training matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    /// Encoded room type
    pub room_type: u32,
    /// Guest capacity
    pub accommodates: f64,
    /// Bedroom count
    pub bedrooms: f64,
    /// Bathroom count
    pub bathrooms: f64,
    /// Bed count
    pub beds: f64,
    /// Encoded neighbourhood
    pub neighbourhood: u32,
    /// Listing id
    pub id: u64,
    /// Calendar date. Only its numeric form is written out.
    pub date: NaiveDate,
    /// Days since 1970-01-01
    pub date_numeric: i64,
    /// Demand season
    pub season: Season,
    /// Adjusted nightly price, absent when the calendar had none
    pub adjusted_price: Option<f64>,
    /// Calendar listing id
    pub listing_id: u64,
}

impl TrainingRow {
    /// Model inputs of this row.
    pub const fn features(&self) -> FeatureVector {
        FeatureVector {
            room_type: self.room_type,
            accommodates: self.accommodates,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            beds: self.beds,
            neighbourhood: self.neighbourhood,
            season: self.season,
            date_numeric: self.date_numeric,
        }
    }
}

/// Rows ordered by date, in [`MATRIX_COLUMNS`] layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingMatrix {
    rows: Vec<TrainingRow>,
}

impl TrainingMatrix {
    /// Wrap rows that are already in output order.
    pub const fn new(rows: Vec<TrainingRow>) -> Self {
        Self { rows }
    }

    /// Rows in output order.
    pub fn rows(&self) -> &[TrainingRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows without a target.
    pub fn missing_targets(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.adjusted_price.is_none())
            .count()
    }

    /// Convert to a DataFrame with one column per [`MATRIX_COLUMNS`] entry.
    pub fn to_dataframe(&self) -> Result<DataFrame, FeatureError> {
        let rows = &self.rows;
        let columns = MATRIX_COLUMNS
            .iter()
            .map(|column| {
                let name: PlSmallStr = column.name().into();
                let series = match column {
                    Column::RoomType => {
                        Series::new(name, rows.iter().map(|r| r.room_type).collect::<Vec<_>>())
                    }
                    Column::Accommodates => Series::new(
                        name,
                        rows.iter().map(|r| r.accommodates).collect::<Vec<_>>(),
                    ),
                    Column::Bedrooms => {
                        Series::new(name, rows.iter().map(|r| r.bedrooms).collect::<Vec<_>>())
                    }
                    Column::Bathrooms => {
                        Series::new(name, rows.iter().map(|r| r.bathrooms).collect::<Vec<_>>())
                    }
                    Column::Beds => {
                        Series::new(name, rows.iter().map(|r| r.beds).collect::<Vec<_>>())
                    }
                    Column::Neighbourhood => Series::new(
                        name,
                        rows.iter().map(|r| r.neighbourhood).collect::<Vec<_>>(),
                    ),
                    Column::Id => Series::new(name, rows.iter().map(|r| r.id).collect::<Vec<_>>()),
                    Column::DateNumeric => Series::new(
                        name,
                        rows.iter().map(|r| r.date_numeric).collect::<Vec<_>>(),
                    ),
                    Column::Season => Series::new(
                        name,
                        rows.iter()
                            .map(|r| u32::from(r.season.code()))
                            .collect::<Vec<_>>(),
                    ),
                    Column::AdjustedPrice => Series::new(
                        name,
                        rows.iter().map(|r| r.adjusted_price).collect::<Vec<_>>(),
                    ),
                    Column::ListingId => {
                        Series::new(name, rows.iter().map(|r| r.listing_id).collect::<Vec<_>>())
                    }
                };
                series.into()
            })
            .collect::<Vec<polars::prelude::Column>>();

        Ok(DataFrame::new(columns)?)
    }

    /// Model inputs and targets, selected by column name.
    pub fn training_set(&self) -> Result<TrainingSet, FeatureError> {
        TrainingSet::from_dataframe(&self.to_dataframe()?)
    }

    /// Write the matrix as CSV with a header row.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), FeatureError> {
        let mut df = self.to_dataframe()?;
        let mut bytes = Vec::new();
        CsvWriter::new(&mut bytes)
            .include_header(true)
            .finish(&mut df)?;
        write_atomic(path.as_ref(), &bytes)?;

        info!(
            rows = df.height(),
            path = %path.as_ref().display(),
            "wrote training matrix"
        );
        Ok(())
    }
}

/// Model inputs and targets extracted from a matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    /// Feature values, one row per matrix row, columns in [`FEATURE_COLUMNS`]
    /// order
    pub features: Array2<f64>,
    /// Target per row
    pub target: Vec<Option<f64>>,
}

impl TrainingSet {
    /// Select model inputs and target by name.
    ///
    /// Extra columns are ignored and column order in the frame does not
    /// matter.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, FeatureError> {
        let height = df.height();
        let mut features = Array2::<f64>::zeros((height, FEATURE_COUNT));

        for (j, column) in FEATURE_COLUMNS.iter().enumerate() {
            let values = float_column(df, *column)?;
            for (i, value) in values.into_iter().enumerate() {
                features[[i, j]] = value.ok_or_else(|| FeatureError::NumericCoercion {
                    column: column.name().to_string(),
                    reason: format!("empty cell in row {i}"),
                })?;
            }
        }

        let target = float_column(df, Column::AdjustedPrice)?;
        Ok(Self { features, target })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Rows that have a target. Rows without one are dropped with a warning.
    pub fn labelled(&self) -> (Array2<f64>, Array1<f64>) {
        let keep: Vec<usize> = self
            .target
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.filter(|v| v.is_finite()).map(|_| i))
            .collect();

        let dropped = self.len() - keep.len();
        if dropped > 0 {
            warn!(dropped, "dropping rows without a target price");
        }

        let features = self.features.select(ndarray::Axis(0), &keep);
        let target = keep
            .iter()
            .filter_map(|&i| self.target[i])
            .collect::<Array1<f64>>();
        (features, target)
    }
}

fn float_column(df: &DataFrame, column: Column) -> Result<Vec<Option<f64>>, FeatureError> {
    let values = df
        .column(column.name())
        .map_err(|_| FeatureError::UnknownColumn(column.name().to_string()))?
        .cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Read a training matrix CSV back into model inputs and targets.
pub fn read_training_set<P: AsRef<Path>>(path: P) -> Result<TrainingSet, FeatureError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;

    info!(
        rows = df.height(),
        columns = df.width(),
        path = %path.as_ref().display(),
        "read training matrix"
    );
    TrainingSet::from_dataframe(&df)
}
