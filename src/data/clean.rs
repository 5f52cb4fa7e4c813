//! Column cleaning: imputation, type coercion, currency conversion and range
//! clamping. Every operation validates first and then replaces the whole
//! column, so a failed call leaves the dataset untouched.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{Result, TableError};

use super::model::{present, ColumnData, ColumnType, Dataset, TIMESTAMP_FORMAT};

/// Pesos per dollar.
pub const DEFAULT_EXCHANGE_RATE: f64 = 900.0;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Mean of the present values rounded to the nearest integer, ties to even.
pub fn rounded_mean(column: &str, values: &[Option<f64>]) -> Result<i64> {
    let present = present(values);
    if present.is_empty() {
        return Err(TableError::conversion(column, "no values to average"));
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    let rounded = mean.round_ties_even();
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(TableError::conversion(
            column,
            format!("mean {mean} does not fit an integer"),
        ));
    }
    Ok(rounded as i64)
}

// ---------------------------------------------------------------------------
// Imputation
// ---------------------------------------------------------------------------

/// Replace every missing cell of a numeric column with its rounded mean.
/// Returns the number of cells filled.
pub fn impute_mean(dataset: &mut Dataset, column: &str) -> Result<usize> {
    let values = dataset.numeric(column)?;
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing == 0 {
        return Ok(0);
    }
    let mean = rounded_mean(column, &values)?;

    let filled = values
        .into_iter()
        .map(|v| Some(v.unwrap_or(mean as f64)))
        .collect();
    dataset.replace_data(column, ColumnData::Float(filled))?;
    log::info!("Imputed {missing} missing values in '{column}' with {mean}");
    Ok(missing)
}

// ---------------------------------------------------------------------------
// Type coercion
// ---------------------------------------------------------------------------

/// Convert a column to `target`. Integer, float and text coercion are
/// all-or-nothing; timestamp coercion turns unparsable cells into missing.
pub fn change_type(dataset: &mut Dataset, column: &str, target: ColumnType) -> Result<()> {
    let data = &dataset.column(column)?.data;
    let converted = match target {
        ColumnType::Integer => to_integer(column, data)?,
        ColumnType::Float => to_float(column, data)?,
        ColumnType::Text => to_text(data),
        ColumnType::Timestamp => to_timestamp(data),
    };
    dataset.replace_data(column, converted)?;
    log::info!("Changed type of '{column}' to {target}");
    Ok(())
}

fn to_integer(column: &str, data: &ColumnData) -> Result<ColumnData> {
    let missing = || TableError::conversion(column, "missing values cannot be integers");
    let ints = match data {
        ColumnData::Integer(v) => v.clone(),
        ColumnData::Float(v) => v
            .iter()
            .map(|x| {
                let x = x.ok_or_else(missing)?;
                if !x.is_finite() || x < i64::MIN as f64 || x >= i64::MAX as f64 {
                    return Err(TableError::conversion(column, format!("{x} is out of integer range")));
                }
                Ok(x.trunc() as i64)
            })
            .collect::<Result<_>>()?,
        ColumnData::Text(v) => v
            .iter()
            .map(|s| {
                let s = s.as_deref().ok_or_else(missing)?;
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| TableError::conversion(column, format!("'{s}' is not an integer")))
            })
            .collect::<Result<_>>()?,
        ColumnData::Timestamp(v) => v
            .iter()
            .map(|t| {
                let t = t.ok_or_else(missing)?;
                t.and_utc().timestamp_nanos_opt().ok_or_else(|| {
                    TableError::conversion(column, format!("{t} is out of nanosecond range"))
                })
            })
            .collect::<Result<_>>()?,
    };
    Ok(ColumnData::Integer(ints))
}

fn to_float(column: &str, data: &ColumnData) -> Result<ColumnData> {
    let floats = match data {
        ColumnData::Integer(v) => v.iter().map(|&i| Some(i as f64)).collect(),
        ColumnData::Float(v) => v.clone(),
        ColumnData::Text(v) => v
            .iter()
            .map(|s| match s {
                None => Ok(None),
                Some(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| TableError::conversion(column, format!("'{s}' is not a number"))),
            })
            .collect::<Result<_>>()?,
        ColumnData::Timestamp(_) => {
            return Err(TableError::conversion(
                column,
                "timestamps cannot be converted to float",
            ))
        }
    };
    Ok(ColumnData::Float(floats))
}

fn to_text(data: &ColumnData) -> ColumnData {
    let text = match data {
        ColumnData::Integer(v) => v.iter().map(|i| Some(i.to_string())).collect(),
        ColumnData::Float(v) => v.iter().map(|x| x.map(|x| x.to_string())).collect(),
        ColumnData::Text(v) => v.clone(),
        ColumnData::Timestamp(v) => v
            .iter()
            .map(|t| t.map(|t| t.format(TIMESTAMP_FORMAT).to_string()))
            .collect(),
    };
    ColumnData::Text(text)
}

fn to_timestamp(data: &ColumnData) -> ColumnData {
    let stamps = match data {
        ColumnData::Integer(v) => v.iter().map(|&i| Some(from_nanos(i))).collect(),
        ColumnData::Float(v) => v
            .iter()
            .map(|x| {
                x.filter(|x| x.is_finite() && *x >= i64::MIN as f64 && *x < i64::MAX as f64)
                    .map(|x| from_nanos(x.trunc() as i64))
            })
            .collect(),
        ColumnData::Text(v) => v
            .iter()
            .map(|s| s.as_deref().and_then(parse_timestamp))
            .collect(),
        ColumnData::Timestamp(v) => v.clone(),
    };
    ColumnData::Timestamp(stamps)
}

fn from_nanos(nanos: i64) -> NaiveDateTime {
    DateTime::from_timestamp_nanos(nanos).naive_utc()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Month-first before day-first, so `03/04/2024` is March 4th.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse the common date and date-time spellings; `None` if nothing matches.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ---------------------------------------------------------------------------
// Currency conversion
// ---------------------------------------------------------------------------

/// Direction of a currency conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyConversion {
    /// Multiply by the rate.
    UsdToClp,
    /// Divide by the rate.
    ClpToUsd,
}

impl CurrencyConversion {
    pub const ALL: [CurrencyConversion; 2] = [CurrencyConversion::UsdToClp, CurrencyConversion::ClpToUsd];

    fn apply(self, value: f64, rate: f64) -> f64 {
        match self {
            CurrencyConversion::UsdToClp => value * rate,
            CurrencyConversion::ClpToUsd => value / rate,
        }
    }
}

impl fmt::Display for CurrencyConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyConversion::UsdToClp => write!(f, "USD → CLP"),
            CurrencyConversion::ClpToUsd => write!(f, "CLP → USD"),
        }
    }
}

/// Scale every value of a numeric column by the exchange rate. The result
/// is always a float column.
pub fn convert_currency(
    dataset: &mut Dataset,
    column: &str,
    conversion: CurrencyConversion,
    rate: f64,
) -> Result<()> {
    if !rate.is_finite() || rate == 0.0 {
        return Err(TableError::conversion(column, format!("invalid exchange rate {rate}")));
    }
    let values = dataset.numeric(column)?;
    let converted: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.map(|x| conversion.apply(x, rate)))
        .collect();
    if let Some(bad) = converted.iter().flatten().find(|x| !x.is_finite()) {
        return Err(TableError::conversion(column, format!("result {bad} is not finite")));
    }
    dataset.replace_data(column, ColumnData::Float(converted))?;
    log::info!("Converted '{column}' ({conversion}) at rate {rate}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Range clamping
// ---------------------------------------------------------------------------

/// Inclusive bounds for [`clamp_range`]. Not checked against each other:
/// `min > max` replaces every value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ClampBounds {
    fn default() -> Self {
        ClampBounds { min: 18.0, max: 70.0 }
    }
}

impl ClampBounds {
    fn excludes(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }
}

/// Replace values outside `bounds` with the column's rounded mean (computed
/// over the original values). Missing cells stay missing. Returns the
/// number of values replaced.
pub fn clamp_range(dataset: &mut Dataset, column: &str, bounds: ClampBounds) -> Result<usize> {
    let values = dataset.numeric(column)?;
    let mean = rounded_mean(column, &values)?;
    let replaced = values
        .iter()
        .flatten()
        .filter(|&&x| bounds.excludes(x))
        .count();

    let data = match &dataset.column(column)?.data {
        ColumnData::Integer(v) => ColumnData::Integer(
            v.iter()
                .map(|&x| if bounds.excludes(x as f64) { mean } else { x })
                .collect(),
        ),
        _ => ColumnData::Float(
            values
                .iter()
                .map(|v| v.map(|x| if bounds.excludes(x) { mean as f64 } else { x }))
                .collect(),
        ),
    };
    dataset.replace_data(column, data)?;
    log::info!(
        "Replaced {replaced} values of '{column}' outside {}-{} with {mean}",
        bounds.min,
        bounds.max
    );
    Ok(replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;
    use proptest::prelude::*;

    fn single(name: &str, data: ColumnData) -> Dataset {
        Dataset::new(vec![Column::new(name, data)]).unwrap()
    }

    fn data<'a>(ds: &'a Dataset, name: &str) -> &'a ColumnData {
        &ds.column(name).unwrap().data
    }

    #[test]
    fn clamp_age_scenario() {
        let mut ds = single("Age", ColumnData::Integer(vec![15, 25, 40, 75]));
        let replaced = clamp_range(&mut ds, "Age", ClampBounds::default()).unwrap();
        assert_eq!(replaced, 2);
        assert_eq!(data(&ds, "Age"), &ColumnData::Integer(vec![39, 25, 40, 39]));
    }

    #[test]
    fn clamp_with_inverted_bounds_replaces_everything() {
        let mut ds = single("Age", ColumnData::Integer(vec![10, 20, 30]));
        clamp_range(&mut ds, "Age", ClampBounds { min: 50.0, max: 5.0 }).unwrap();
        assert_eq!(data(&ds, "Age"), &ColumnData::Integer(vec![20, 20, 20]));
    }

    #[test]
    fn clamp_keeps_missing_cells() {
        let mut ds = single("x", ColumnData::Float(vec![Some(1.0), None, Some(100.0)]));
        clamp_range(&mut ds, "x", ClampBounds { min: 0.0, max: 10.0 }).unwrap();
        assert_eq!(data(&ds, "x"), &ColumnData::Float(vec![Some(1.0), None, Some(50.0)]));
    }

    #[test]
    fn impute_fills_with_rounded_mean() {
        let mut ds = single("x", ColumnData::Float(vec![Some(1.0), None, Some(2.0), None]));
        assert_eq!(impute_mean(&mut ds, "x").unwrap(), 2);
        // mean 1.5 rounds half to even
        assert_eq!(
            data(&ds, "x"),
            &ColumnData::Float(vec![Some(1.0), Some(2.0), Some(2.0), Some(2.0)])
        );
        assert_eq!(impute_mean(&mut ds, "x").unwrap(), 0);
    }

    #[test]
    fn impute_rounds_ties_to_even() {
        let mut ds = single("x", ColumnData::Float(vec![Some(2.0), Some(3.0), None]));
        impute_mean(&mut ds, "x").unwrap();
        assert_eq!(data(&ds, "x"), &ColumnData::Float(vec![Some(2.0), Some(3.0), Some(2.0)]));
    }

    #[test]
    fn impute_on_column_without_rows_is_noop() {
        let mut ds = single("x", ColumnData::Float(Vec::new()));
        assert_eq!(impute_mean(&mut ds, "x").unwrap(), 0);
        assert_eq!(data(&ds, "x"), &ColumnData::Float(Vec::new()));
    }

    #[test]
    fn impute_rejects_bad_columns() {
        let mut ds = Dataset::new(vec![
            Column::new("name", ColumnData::Text(vec![Some("a".into())])),
            Column::new("empty", ColumnData::Float(vec![None])),
        ])
        .unwrap();
        let before = ds.clone();
        assert!(matches!(impute_mean(&mut ds, "name"), Err(TableError::NotNumeric { .. })));
        assert!(matches!(impute_mean(&mut ds, "nope"), Err(TableError::ColumnNotFound(_))));
        assert!(matches!(
            impute_mean(&mut ds, "empty"),
            Err(TableError::ConversionFailure { .. })
        ));
        assert_eq!(ds, before);
    }

    #[test]
    fn integer_coercion_is_all_or_nothing() {
        let mut ds = single("x", ColumnData::Float(vec![Some(1.9), None]));
        let before = ds.clone();
        assert!(change_type(&mut ds, "x", ColumnType::Integer).is_err());
        assert_eq!(ds, before);

        let mut ds = single("x", ColumnData::Text(vec![Some("7".into()), Some("seven".into())]));
        let before = ds.clone();
        assert!(matches!(
            change_type(&mut ds, "x", ColumnType::Integer),
            Err(TableError::ConversionFailure { .. })
        ));
        assert_eq!(ds, before);

        let mut ds = single("x", ColumnData::Float(vec![Some(1.9), Some(-2.5)]));
        change_type(&mut ds, "x", ColumnType::Integer).unwrap();
        assert_eq!(data(&ds, "x"), &ColumnData::Integer(vec![1, -2]));
    }

    #[test]
    fn float_and_text_coercion() {
        let mut ds = single("x", ColumnData::Text(vec![Some(" 2.5".into()), None]));
        change_type(&mut ds, "x", ColumnType::Float).unwrap();
        assert_eq!(data(&ds, "x"), &ColumnData::Float(vec![Some(2.5), None]));

        change_type(&mut ds, "x", ColumnType::Text).unwrap();
        assert_eq!(data(&ds, "x"), &ColumnData::Text(vec![Some("2.5".into()), None]));
    }

    #[test]
    fn timestamp_coercion_is_lossy() {
        let mut ds = single(
            "hired",
            ColumnData::Text(vec![
                Some("2021-03-04".into()),
                Some("not a date".into()),
                Some("2020-01-02 10:30:00".into()),
                None,
            ]),
        );
        change_type(&mut ds, "hired", ColumnType::Timestamp).unwrap();
        let expected = vec![
            NaiveDate::from_ymd_opt(2021, 3, 4).and_then(|d| d.and_hms_opt(0, 0, 0)),
            None,
            NaiveDate::from_ymd_opt(2020, 1, 2).and_then(|d| d.and_hms_opt(10, 30, 0)),
            None,
        ];
        assert_eq!(data(&ds, "hired"), &ColumnData::Timestamp(expected));

        assert!(change_type(&mut ds, "hired", ColumnType::Float).is_err());
    }

    #[test]
    fn parses_common_date_spellings() {
        let march_4 = NaiveDate::from_ymd_opt(2024, 3, 4).and_then(|d| d.and_hms_opt(0, 0, 0));
        assert_eq!(parse_timestamp("2024-03-04"), march_4);
        assert_eq!(parse_timestamp("03/04/2024"), march_4);
        assert_eq!(parse_timestamp("2024-03-04T00:00:00Z"), march_4);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn currency_conversion_scales_by_rate() {
        let mut ds = single("Salary", ColumnData::Integer(vec![1, 2]));
        convert_currency(&mut ds, "Salary", CurrencyConversion::UsdToClp, DEFAULT_EXCHANGE_RATE).unwrap();
        assert_eq!(data(&ds, "Salary"), &ColumnData::Float(vec![Some(900.0), Some(1800.0)]));
    }

    #[test]
    fn currency_conversion_rejects_bad_input() {
        let mut ds = single("Salary", ColumnData::Float(vec![Some(f64::MAX)]));
        let before = ds.clone();
        assert!(convert_currency(&mut ds, "Salary", CurrencyConversion::UsdToClp, 900.0).is_err());
        assert!(convert_currency(&mut ds, "Salary", CurrencyConversion::ClpToUsd, 0.0).is_err());
        assert_eq!(ds, before);
    }

    proptest! {
        #[test]
        fn impute_leaves_no_gaps(values in prop::collection::vec(prop::option::of(-1.0e6..1.0e6f64), 1..40)) {
            prop_assume!(values.iter().any(|v| v.is_some()));
            let mean = rounded_mean("x", &values).unwrap() as f64;
            let mut ds = single("x", ColumnData::Float(values.clone()));
            impute_mean(&mut ds, "x").unwrap();

            let after = ds.numeric("x").unwrap();
            for (before, after) in values.iter().zip(&after) {
                match before {
                    Some(v) => prop_assert_eq!(Some(*v), *after),
                    None => prop_assert_eq!(Some(mean), *after),
                }
            }
        }

        #[test]
        fn clamp_only_touches_out_of_range(
            values in prop::collection::vec(0i64..120, 1..40),
            min in 0i64..120,
            max in 0i64..120,
        ) {
            let as_f64: Vec<Option<f64>> = values.iter().map(|&v| Some(v as f64)).collect();
            let mean = rounded_mean("x", &as_f64).unwrap();
            let mut ds = single("x", ColumnData::Integer(values.clone()));
            clamp_range(&mut ds, "x", ClampBounds { min: min as f64, max: max as f64 }).unwrap();

            let ColumnData::Integer(after) = data(&ds, "x") else {
                panic!("integer column changed type");
            };
            for (&before, &after) in values.iter().zip(after) {
                if min <= before && before <= max {
                    prop_assert_eq!(before, after);
                } else {
                    prop_assert_eq!(mean, after);
                }
            }
        }

        #[test]
        fn currency_round_trip(values in prop::collection::vec(-1.0e9..1.0e9f64, 1..40)) {
            let original: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
            let mut ds = single("x", ColumnData::Float(original.clone()));
            convert_currency(&mut ds, "x", CurrencyConversion::UsdToClp, DEFAULT_EXCHANGE_RATE).unwrap();
            convert_currency(&mut ds, "x", CurrencyConversion::ClpToUsd, DEFAULT_EXCHANGE_RATE).unwrap();

            for (a, b) in original.iter().flatten().zip(present(&ds.numeric("x").unwrap())) {
                prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
            }
        }
    }
}
