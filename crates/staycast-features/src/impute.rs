//! Room count imputation.
//!
//! Missing room counts are derived from guest capacity first. Cells that
//! still hold no number after that (unparsable text, or no capacity to
//! derive from) fall back to the column median over all rows.

use crate::error::FeatureError;
use crate::schema::Column;
use polars::prelude::{DataFrame, IntoLazy, NamedFrom, Series, col};
use staycast_data::Measure;

/// Raw capacity and room counts of one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Rooms {
    /// Guest capacity
    pub accommodates: Measure,
    /// Bedroom count
    pub bedrooms: Measure,
    /// Bathroom count
    pub bathrooms: Measure,
    /// Bed count
    pub beds: Measure,
}

/// Fully numeric capacity and room counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImputedRooms {
    /// Guest capacity
    pub accommodates: f64,
    /// Bedroom count
    pub bedrooms: f64,
    /// Bathroom count
    pub bathrooms: f64,
    /// Bed count
    pub beds: f64,
}

impl From<ImputedRooms> for Rooms {
    fn from(rooms: ImputedRooms) -> Self {
        Self {
            accommodates: Measure::Value(rooms.accommodates),
            bedrooms: Measure::Value(rooms.bedrooms),
            bathrooms: Measure::Value(rooms.bathrooms),
            beds: Measure::Value(rooms.beds),
        }
    }
}

const COLUMNS: [Column; 4] = [
    Column::Accommodates,
    Column::Bedrooms,
    Column::Bathrooms,
    Column::Beds,
];

/// Apply the capacity rules, then coerce to numbers.
///
/// Only empty cells are derived; unparsable cells become `None` without
/// being derived. Output order is accommodates, bedrooms, bathrooms, beds.
pub fn apply_rules(rooms: &Rooms) -> [Option<f64>; 4] {
    let accommodates = rooms.accommodates.value();
    let derive = |measure: &Measure, rule: fn(f64) -> f64| match measure {
        Measure::Missing => accommodates.map(rule),
        other => other.value(),
    };

    [
        accommodates,
        derive(&rooms.bedrooms, |a| (a / 2.0).ceil()),
        derive(&rooms.bathrooms, |a| (a / 3.0).ceil()),
        derive(&rooms.beds, |a| a),
    ]
}

/// Impute every row.
///
/// Gaps left by the capacity rules take the median of the column's present
/// values; even counts average the two middle values.
///
/// # Errors
///
/// [`FeatureError::NumericCoercion`] when a column has a gap but no value
/// anywhere to take a median from.
pub fn impute(rows: &[Rooms]) -> Result<Vec<ImputedRooms>, FeatureError> {
    let ruled: Vec<[Option<f64>; 4]> = rows.iter().map(apply_rules).collect();

    let columns = COLUMNS
        .iter()
        .enumerate()
        .map(|(slot, column)| {
            let values: Vec<Option<f64>> = ruled.iter().map(|r| r[slot]).collect();
            Series::new(column.name().into(), values).into()
        })
        .collect::<Vec<polars::prelude::Column>>();

    let filled = DataFrame::new(columns)?
        .lazy()
        .with_columns(COLUMNS.map(|c| col(c.name()).fill_null(col(c.name()).median())))
        .collect()?;

    let mut values = Vec::with_capacity(COLUMNS.len());
    for column in COLUMNS {
        let present: Vec<f64> = filled
            .column(column.name())?
            .f64()?
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| FeatureError::NumericCoercion {
                    column: column.name().to_string(),
                    reason: "no value to impute from".to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        values.push(present);
    }

    Ok((0..rows.len())
        .map(|i| ImputedRooms {
            accommodates: values[0][i],
            bedrooms: values[1][i],
            bathrooms: values[2][i],
            beds: values[3][i],
        })
        .collect())
}

/// Impute a single serving request.
///
/// Capacity is always present on a request, so the rules resolve every
/// null room count and no median is needed.
pub fn impute_request(
    accommodates: f64,
    bedrooms: Option<f64>,
    bathrooms: Option<f64>,
    beds: Option<f64>,
) -> Result<ImputedRooms, FeatureError> {
    let rooms = Rooms {
        accommodates: Measure::Value(accommodates),
        bedrooms: bedrooms.into(),
        bathrooms: bathrooms.into(),
        beds: beds.into(),
    };

    let values = apply_rules(&rooms);
    let get = |slot: usize| {
        values[slot].ok_or_else(|| FeatureError::NumericCoercion {
            column: COLUMNS[slot].name().to_string(),
            reason: "request value is not a number".to_string(),
        })
    };

    Ok(ImputedRooms {
        accommodates: get(0)?,
        bedrooms: get(1)?,
        bathrooms: get(2)?,
        beds: get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn rooms(acc: Measure, bedrooms: Measure, bathrooms: Measure, beds: Measure) -> Rooms {
        Rooms {
            accommodates: acc,
            bedrooms,
            bathrooms,
            beds,
        }
    }

    #[rstest]
    #[case(2.0, 1.0, 1.0, 2.0)]
    #[case(3.0, 2.0, 1.0, 3.0)]
    #[case(4.0, 2.0, 2.0, 4.0)]
    #[case(7.0, 4.0, 3.0, 7.0)]
    fn test_rules(
        #[case] acc: f64,
        #[case] bedrooms: f64,
        #[case] bathrooms: f64,
        #[case] beds: f64,
    ) {
        let r = rooms(
            Measure::Value(acc),
            Measure::Missing,
            Measure::Missing,
            Measure::Missing,
        );
        assert_eq!(
            apply_rules(&r),
            [Some(acc), Some(bedrooms), Some(bathrooms), Some(beds)]
        );
    }

    #[test]
    fn test_present_values_kept() {
        let r = rooms(
            Measure::Value(6.0),
            Measure::Value(1.0),
            Measure::Value(2.5),
            Measure::Value(1.0),
        );
        assert_eq!(apply_rules(&r), [Some(6.0), Some(1.0), Some(2.5), Some(1.0)]);
    }

    #[test]
    fn test_unparsable_falls_back_to_median() {
        let rows = vec![
            rooms(
                Measure::Value(2.0),
                Measure::Value(1.0),
                Measure::Value(1.0),
                Measure::Value(1.0),
            ),
            rooms(
                Measure::Value(4.0),
                Measure::Value(2.0),
                Measure::Value(2.0),
                Measure::Value(3.0),
            ),
            rooms(
                Measure::Value(8.0),
                Measure::Unparsable("many".to_string()),
                Measure::Missing,
                Measure::Value(4.0),
            ),
        ];

        let imputed = impute(&rows).unwrap();
        // median of {1, 2}
        assert_relative_eq!(imputed[2].bedrooms, 1.5);
        // rule, not median
        assert_relative_eq!(imputed[2].bathrooms, 3.0);
        assert_relative_eq!(imputed[2].beds, 4.0);
    }

    #[test]
    fn test_missing_capacity_uses_medians() {
        let rows = vec![
            rooms(
                Measure::Value(2.0),
                Measure::Missing,
                Measure::Missing,
                Measure::Missing,
            ),
            rooms(
                Measure::Missing,
                Measure::Missing,
                Measure::Value(2.0),
                Measure::Missing,
            ),
        ];

        let imputed = impute(&rows).unwrap();
        assert_relative_eq!(imputed[1].accommodates, 2.0);
        assert_relative_eq!(imputed[1].bedrooms, 1.0);
        assert_relative_eq!(imputed[1].bathrooms, 2.0);
        assert_relative_eq!(imputed[1].beds, 2.0);
    }

    #[test]
    fn test_no_median_available() {
        let rows = vec![rooms(
            Measure::Missing,
            Measure::Missing,
            Measure::Missing,
            Measure::Missing,
        )];
        assert!(matches!(
            impute(&rows),
            Err(FeatureError::NumericCoercion { .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            rooms(
                Measure::Value(5.0),
                Measure::Missing,
                Measure::Unparsable("?".to_string()),
                Measure::Missing,
            ),
            rooms(
                Measure::Value(2.0),
                Measure::Value(1.0),
                Measure::Value(1.0),
                Measure::Missing,
            ),
        ];

        let once = impute(&rows).unwrap();
        let again_input: Vec<Rooms> = once.iter().copied().map(Rooms::from).collect();
        let twice = impute(&again_input).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_median_of_odd_count() {
        let known = |bedrooms: f64| {
            rooms(
                Measure::Value(2.0),
                Measure::Value(bedrooms),
                Measure::Value(1.0),
                Measure::Value(1.0),
            )
        };
        let rows = vec![
            known(5.0),
            known(1.0),
            rooms(
                Measure::Missing,
                Measure::Unparsable("?".to_string()),
                Measure::Value(1.0),
                Measure::Value(1.0),
            ),
            known(3.0),
        ];

        let imputed = impute(&rows).unwrap();
        assert_relative_eq!(imputed[2].bedrooms, 3.0);
        assert_relative_eq!(imputed[2].accommodates, 2.0);
        assert_eq!(imputed[0].bedrooms, 5.0);
    }

    #[test]
    fn test_impute_empty() {
        assert!(impute(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_request_imputation() {
        let imputed = impute_request(2.0, None, None, None).unwrap();
        assert_eq!(
            imputed,
            ImputedRooms {
                accommodates: 2.0,
                bedrooms: 1.0,
                bathrooms: 1.0,
                beds: 2.0,
            }
        );

        let kept = impute_request(4.0, Some(3.0), None, Some(5.0)).unwrap();
        assert_relative_eq!(kept.bedrooms, 3.0);
        assert_relative_eq!(kept.bathrooms, 2.0);
        assert_relative_eq!(kept.beds, 5.0);
    }
}
