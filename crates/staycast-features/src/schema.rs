//! Feature Schema
//!
//! The single named definition of every column the pipeline emits. The
//! training matrix is laid out in [`MATRIX_COLUMNS`] order; the model sees
//! [`FEATURE_COLUMNS`], selected by name from the matrix at training time and
//! assembled in the same order by the serving path.

use staycast_season::Season;
use std::fmt;

/// How a column is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Label-encoded string column
    Categorical,
    /// Numeric listing attribute
    Numeric,
    /// Derived from the calendar date
    Temporal,
    /// Listing identifier
    Identifier,
    /// Regression target
    Target,
}

/// A column of the training matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Encoded room type
    RoomType,
    /// Guest capacity
    Accommodates,
    /// Bedroom count
    Bedrooms,
    /// Bathroom count
    Bathrooms,
    /// Bed count
    Beds,
    /// Encoded neighbourhood
    Neighbourhood,
    /// Listing id from the listings file
    Id,
    /// Days since 1970-01-01
    DateNumeric,
    /// Season code of the date
    Season,
    /// Adjusted nightly price
    AdjustedPrice,
    /// Listing id from the calendar file
    ListingId,
}

/// Training matrix column order.
pub const MATRIX_COLUMNS: [Column; 11] = [
    Column::RoomType,
    Column::Accommodates,
    Column::Bedrooms,
    Column::Bathrooms,
    Column::Beds,
    Column::Neighbourhood,
    Column::Id,
    Column::DateNumeric,
    Column::Season,
    Column::AdjustedPrice,
    Column::ListingId,
];

/// Model input order, shared by training and serving.
pub const FEATURE_COLUMNS: [Column; 8] = [
    Column::RoomType,
    Column::Accommodates,
    Column::Bedrooms,
    Column::Bathrooms,
    Column::Beds,
    Column::Neighbourhood,
    Column::Season,
    Column::DateNumeric,
];

/// Number of model inputs.
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Columns encoded through the label store.
pub const CATEGORICAL_COLUMNS: [Column; 2] = [Column::RoomType, Column::Neighbourhood];

impl Column {
    /// Column name in the matrix and artifacts.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RoomType => "room_type",
            Self::Accommodates => "accommodates",
            Self::Bedrooms => "bedrooms",
            Self::Bathrooms => "bathrooms",
            Self::Beds => "beds",
            Self::Neighbourhood => "neighbourhood",
            Self::Id => "id",
            Self::DateNumeric => "date_numeric",
            Self::Season => "season",
            Self::AdjustedPrice => "adjusted_price",
            Self::ListingId => "listing_id",
        }
    }

    /// How the column is produced.
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::RoomType | Self::Neighbourhood => ColumnKind::Categorical,
            Self::Accommodates | Self::Bedrooms | Self::Bathrooms | Self::Beds => {
                ColumnKind::Numeric
            }
            Self::DateNumeric | Self::Season => ColumnKind::Temporal,
            Self::Id | Self::ListingId => ColumnKind::Identifier,
            Self::AdjustedPrice => ColumnKind::Target,
        }
    }

    /// Brief description of the column.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::RoomType => "Room type, label encoded",
            Self::Accommodates => "Number of guests the listing accommodates",
            Self::Bedrooms => "Bedrooms, imputed as ceil(accommodates / 2) when missing",
            Self::Bathrooms => "Bathrooms, imputed as ceil(accommodates / 3) when missing",
            Self::Beds => "Beds, imputed as accommodates when missing",
            Self::Neighbourhood => "Cleansed neighbourhood, label encoded",
            Self::Id => "Listing id",
            Self::DateNumeric => "Days since 1970-01-01",
            Self::Season => "Demand season code (0 low, 1 medium, 2 high)",
            Self::AdjustedPrice => "Adjusted nightly price (target)",
            Self::ListingId => "Calendar listing id",
        }
    }

    /// Whether the model consumes this column.
    pub fn is_model_input(&self) -> bool {
        FEATURE_COLUMNS.contains(self)
    }

    /// Look up a column by name.
    pub fn from_name(name: &str) -> Option<Self> {
        MATRIX_COLUMNS.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Column metadata
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column name
    pub name: &'static str,
    /// How the column is produced
    pub kind: ColumnKind,
    /// Brief description
    pub description: &'static str,
    /// Position among model inputs, if the model consumes the column
    pub feature_index: Option<usize>,
}

/// Metadata for every matrix column, in matrix order.
pub fn available_columns() -> Vec<ColumnInfo> {
    MATRIX_COLUMNS
        .iter()
        .map(|column| ColumnInfo {
            name: column.name(),
            kind: column.kind(),
            description: column.description(),
            feature_index: FEATURE_COLUMNS.iter().position(|c| c == column),
        })
        .collect()
}

/// Get column info by name
pub fn get_column_info(name: &str) -> Option<ColumnInfo> {
    available_columns().into_iter().find(|c| c.name == name)
}

/// Model feature names in input order.
pub fn feature_names() -> Vec<&'static str> {
    FEATURE_COLUMNS.iter().map(Column::name).collect()
}

/// Matrix column names in output order.
pub fn matrix_column_names() -> Vec<&'static str> {
    MATRIX_COLUMNS.iter().map(Column::name).collect()
}

/// One fully encoded model input.
///
/// Fields are named; the positional form exists only through
/// [`FeatureVector::to_array`], which follows [`FEATURE_COLUMNS`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
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
    /// Demand season
    pub season: Season,
    /// Days since 1970-01-01
    pub date_numeric: i64,
}

impl FeatureVector {
    /// Value of a model input column. Non-input columns have no value.
    pub fn get(&self, column: Column) -> Option<f64> {
        let value = match column {
            Column::RoomType => f64::from(self.room_type),
            Column::Accommodates => self.accommodates,
            Column::Bedrooms => self.bedrooms,
            Column::Bathrooms => self.bathrooms,
            Column::Beds => self.beds,
            Column::Neighbourhood => f64::from(self.neighbourhood),
            Column::Season => f64::from(self.season.code()),
            Column::DateNumeric => self.date_numeric as f64,
            Column::Id | Column::AdjustedPrice | Column::ListingId => return None,
        };
        Some(value)
    }

    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        FEATURE_COLUMNS.map(|column| self.get(column).unwrap_or(f64::NAN))
    }
}
