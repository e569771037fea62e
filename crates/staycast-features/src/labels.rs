//! Label Store
//!
//! Per-column string to integer vocabularies. Codes are assigned in sorted
//! order of the distinct values seen at fit time, so the same input always
//! yields the same codes. A store is fit once and then only read.

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use staycast_data::artifact::{check_version, read_json, write_json};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Artifact format version written by this build.
pub const LABEL_STORE_VERSION: u32 = 1;

/// Frozen vocabulary for one categorical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    codes: BTreeMap<String, u32>,
}

impl LabelEncoder {
    /// Fit a vocabulary over the given values.
    ///
    /// The k-th smallest distinct value (lexicographic by bytes) receives
    /// code k.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        let codes = distinct
            .into_iter()
            .zip(0u32..)
            .collect::<BTreeMap<_, _>>();

        Self { codes }
    }

    /// Rebuild a persisted vocabulary.
    ///
    /// Values must be distinct and the codes must be exactly `0..K`.
    fn from_pairs(column: &str, pairs: Vec<(String, u32)>) -> Result<Self, FeatureError> {
        let invalid = |reason: String| FeatureError::InvalidVocabulary {
            column: column.to_string(),
            reason,
        };

        let count = pairs.len();
        if count == 0 {
            return Err(invalid("no classes".to_string()));
        }

        let codes: BTreeSet<u32> = pairs.iter().map(|(_, code)| *code).collect();
        let codes_expected = codes.len() == count && codes.iter().copied().eq(0..count as u32);
        if !codes_expected {
            return Err(invalid(format!("codes are not 0..{count}")));
        }

        let encoder = Self {
            codes: pairs.into_iter().collect(),
        };
        if encoder.len() != count {
            return Err(invalid("duplicate values".to_string()));
        }
        Ok(encoder)
    }

    /// Code of a value, if it was seen at fit time.
    pub fn code(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Value behind a code.
    pub fn value(&self, code: u32) -> Option<&str> {
        self.codes
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(v, _)| v.as_str())
    }

    /// Vocabulary size.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Values in code order.
    pub fn classes(&self) -> Vec<&str> {
        let mut pairs: Vec<_> = self.codes.iter().collect();
        pairs.sort_by_key(|(_, code)| **code);
        pairs.into_iter().map(|(v, _)| v.as_str()).collect()
    }
}

/// Vocabularies for every categorical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStore {
    encoders: BTreeMap<String, LabelEncoder>,
}

#[derive(Serialize, Deserialize)]
struct LabelStoreFile {
    version: u32,
    columns: BTreeMap<String, Vec<(String, u32)>>,
}

impl LabelStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the vocabulary for `column`.
    ///
    /// # Errors
    ///
    /// Fails when the column already has a vocabulary, or when no values
    /// are given.
    pub fn fit<I, S>(&mut self, column: &str, values: I) -> Result<&LabelEncoder, FeatureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.encoders.contains_key(column) {
            return Err(FeatureError::DuplicateColumn(column.to_string()));
        }

        let encoder = LabelEncoder::fit(values);
        if encoder.is_empty() {
            return Err(FeatureError::EmptyData(format!(
                "no values to fit vocabulary for {column}"
            )));
        }

        debug!(column, classes = encoder.len(), "fitted label vocabulary");
        Ok(self.encoders.entry(column.to_string()).or_insert(encoder))
    }

    /// Encode a value.
    ///
    /// # Errors
    ///
    /// [`FeatureError::UnknownColumn`] when the column was never fit and
    /// [`FeatureError::UnknownCategory`] when the value was not seen at fit
    /// time.
    pub fn transform(&self, column: &str, value: &str) -> Result<u32, FeatureError> {
        let encoder = self
            .encoders
            .get(column)
            .ok_or_else(|| FeatureError::UnknownColumn(column.to_string()))?;

        encoder
            .code(value)
            .ok_or_else(|| FeatureError::UnknownCategory {
                column: column.to_string(),
                value: value.to_string(),
            })
    }

    /// Vocabulary of a column.
    pub fn vocabulary(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    /// Columns with a fitted vocabulary.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    /// Persist as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FeatureError> {
        let columns = self
            .encoders
            .iter()
            .map(|(column, encoder)| {
                let pairs = encoder
                    .classes()
                    .into_iter()
                    .zip(0u32..)
                    .map(|(v, c)| (v.to_string(), c))
                    .collect();
                (column.clone(), pairs)
            })
            .collect();

        let file = LabelStoreFile {
            version: LABEL_STORE_VERSION,
            columns,
        };
        Ok(write_json(path, &file)?)
    }

    /// Load a persisted store.
    ///
    /// # Errors
    ///
    /// [`FeatureError::InvalidVocabulary`] when a column's codes are not a
    /// one-to-one mapping onto `0..K`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FeatureError> {
        let file: LabelStoreFile = read_json(path)?;
        check_version("label store", file.version, LABEL_STORE_VERSION)?;

        let encoders = file
            .columns
            .into_iter()
            .map(|(column, pairs)| {
                let encoder = LabelEncoder::from_pairs(&column, pairs)?;
                Ok((column, encoder))
            })
            .collect::<Result<_, FeatureError>>()?;

        Ok(Self { encoders })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fitted() -> LabelStore {
        let mut store = LabelStore::new();
        store
            .fit(
                "neighbourhood",
                ["Retiro", "Centro", "Salamanca", "Centro", "Chamberí"],
            )
            .unwrap();
        store
            .fit("room_type", ["Private room", "Entire home/apt"])
            .unwrap();
        store
    }

    #[rstest]
    #[case("Centro", 0)]
    #[case("Chamberí", 1)]
    #[case("Retiro", 2)]
    #[case("Salamanca", 3)]
    fn test_sorted_codes(#[case] value: &str, #[case] code: u32) {
        assert_eq!(fitted().transform("neighbourhood", value).unwrap(), code);
    }

    #[test]
    fn test_codes_independent_of_input_order() {
        let a = LabelEncoder::fit(["b", "a", "c"]);
        let b = LabelEncoder::fit(["c", "c", "a", "b"]);
        assert_eq!(a, b);
        assert_eq!(a.classes(), vec!["a", "b", "c"]);
        assert_eq!(a.value(2), Some("c"));
    }

    #[test]
    fn test_unknown_value_and_column() {
        let store = fitted();
        assert!(matches!(
            store.transform("neighbourhood", "Atlantis"),
            Err(FeatureError::UnknownCategory { .. })
        ));
        assert!(matches!(
            store.transform("host_name", "x"),
            Err(FeatureError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_fit_rejects_duplicate_and_empty() {
        let mut store = fitted();
        assert!(matches!(
            store.fit("room_type", ["Shared room"]),
            Err(FeatureError::DuplicateColumn(_))
        ));
        assert!(matches!(
            store.fit("beds", Vec::<String>::new()),
            Err(FeatureError::EmptyData(_))
        ));
        // failed fits leave the store untouched
        assert_eq!(store.columns().count(), 2);
    }

    #[test]
    fn test_json_layout() {
        let store = fitted();
        let dir = std::env::temp_dir().join(format!("staycast-labels-{}", std::process::id()));
        let path = dir.join("labels.json");
        store.save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["columns"]["room_type"][0][0], "Entire home/apt");
        assert_eq!(json["columns"]["room_type"][0][1], 0);
        assert_eq!(json["columns"]["room_type"][1][1], 1);

        let loaded = LabelStore::load(&path).unwrap();
        assert_eq!(loaded, store);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[rstest]
    #[case("codes", r#"[["Centro", 0], ["Retiro", 0]]"#)]
    #[case("values", r#"[["Centro", 0], ["Centro", 1]]"#)]
    #[case("gap", r#"[["Centro", 0], ["Retiro", 2]]"#)]
    #[case("offset", r#"[["Centro", 1]]"#)]
    #[case("empty", "[]")]
    fn test_load_rejects_broken_vocabulary(#[case] name: &str, #[case] pairs: &str) {
        let dir = std::env::temp_dir().join(format!(
            "staycast-labels-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("labels.json");
        let json = format!(r#"{{"version": 1, "columns": {{"neighbourhood": {pairs}}}}}"#);
        std::fs::write(&path, json).unwrap();

        match LabelStore::load(&path) {
            Err(FeatureError::InvalidVocabulary { column, .. }) => {
                assert_eq!(column, "neighbourhood");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        std::fs::remove_dir_all(dir).unwrap();
    }
}
