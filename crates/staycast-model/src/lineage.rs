//! Preprocessing lineage stored with a fitted model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The season index and vocabularies a model was trained against.
///
/// Serving refuses a model whose lineage differs from the artifacts it is
/// loaded next to, since its encoded inputs would mean something else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    /// Year the season index is keyed on
    pub canonical_year: i32,
    /// One season code per day of the canonical year, from January 1;
    /// `-` marks a day without a season
    pub seasons: String,
    /// Classes of each categorical column in code order
    pub vocabularies: BTreeMap<String, Vec<String>>,
}

impl Lineage {
    /// First difference from `other`, described for logs and errors.
    pub fn difference(&self, other: &Self) -> Option<String> {
        if self.canonical_year != other.canonical_year {
            return Some(format!(
                "canonical year {} vs {}",
                self.canonical_year, other.canonical_year
            ));
        }
        if let Some(day) = self
            .seasons
            .chars()
            .zip(other.seasons.chars())
            .position(|(a, b)| a != b)
        {
            return Some(format!("season of day {} differs", day + 1));
        }
        if self.seasons.len() != other.seasons.len() {
            return Some("season index length differs".to_string());
        }
        let columns = self.vocabularies.keys().chain(other.vocabularies.keys());
        for column in columns {
            if self.vocabularies.get(column) != other.vocabularies.get(column) {
                return Some(format!("vocabulary for {column} differs"));
            }
        }
        None
    }
}
