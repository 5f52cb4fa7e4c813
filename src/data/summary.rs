use std::fmt;

use super::analysis::{self, Quartiles};
use super::model::{present, ColumnType, Dataset, Value};

pub const DESCRIBE_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// First `n` rows.
pub fn head(dataset: &Dataset, n: usize) -> Vec<(usize, Vec<Value>)> {
    (0..dataset.len().min(n)).map(|i| (i, dataset.row(i))).collect()
}

/// Last `n` rows.
pub fn tail(dataset: &Dataset, n: usize) -> Vec<(usize, Vec<Value>)> {
    let start = dataset.len().saturating_sub(n);
    (start..dataset.len()).map(|i| (i, dataset.row(i))).collect()
}

/// Per numeric column summary, one value per entry of [`DESCRIBE_ROWS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub column: String,
    pub values: [Option<f64>; 8],
}

pub fn describe(dataset: &Dataset) -> Vec<Description> {
    dataset
        .numeric_column_names()
        .into_iter()
        .map(|name| {
            let values = dataset.numeric(&name).map(|v| present(&v)).unwrap_or_default();
            let quartiles = Quartiles::of(&values);
            let min = values.iter().copied().reduce(f64::min);
            let max = values.iter().copied().reduce(f64::max);
            Description {
                values: [
                    Some(values.len() as f64),
                    analysis::mean(&values),
                    analysis::sample_std(&values),
                    min,
                    quartiles.map(|q| q.q1),
                    quartiles.map(|q| q.median),
                    quartiles.map(|q| q.q3),
                    max,
                ],
                column: name,
            }
        })
        .collect()
}

/// Missing cells per column, in table order.
pub fn missing_counts(dataset: &Dataset) -> Vec<(String, usize)> {
    dataset
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.data.missing_count()))
        .collect()
}

// ---------------------------------------------------------------------------
// Info report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub non_null: usize,
    pub kind: ColumnType,
}

/// Structure of the table: size, and per column its non-null count and type.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
}

pub fn info(dataset: &Dataset) -> DatasetInfo {
    DatasetInfo {
        rows: dataset.len(),
        columns: dataset
            .columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                non_null: c.data.len() - c.data.missing_count(),
                kind: c.data.kind(),
            })
            .collect(),
    }
}

impl fmt::Display for DatasetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RangeIndex: {} entries, 0 to {}", self.rows, self.rows.saturating_sub(1))?;
        writeln!(f, "Data columns (total {} columns):", self.columns.len())?;
        let width = self.columns.iter().map(|c| c.name.len()).max().unwrap_or(0).max(6);
        writeln!(f, " #   {:<width$}  Non-Null Count  Dtype", "Column")?;
        for (i, col) in self.columns.iter().enumerate() {
            writeln!(
                f,
                " {:<3} {:<width$}  {:>5} non-null  {}",
                i,
                col.name,
                col.non_null,
                col.kind
            )?;
        }

        let mut kinds: Vec<(ColumnType, usize)> = Vec::new();
        for col in &self.columns {
            match kinds.iter_mut().find(|(k, _)| *k == col.kind) {
                Some((_, n)) => *n += 1,
                None => kinds.push((col.kind, 1)),
            }
        }
        let dtypes: Vec<String> = kinds.iter().map(|(k, n)| format!("{k}({n})")).collect();
        write!(f, "dtypes: {}", dtypes.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, ColumnData};

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new("Age", ColumnData::Integer(vec![1, 2, 3, 4, 5, 6, 7])),
            Column::new(
                "Name",
                ColumnData::Text(vec![Some("a".into()), None, None, None, None, None, None]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn head_and_tail() {
        let ds = sample();
        let first = head(&ds, 5);
        assert_eq!(first.len(), 5);
        assert_eq!(first[0], (0, vec![Value::Integer(1), Value::Text("a".into())]));

        let last = tail(&ds, 5);
        assert_eq!(last.first().map(|r| r.0), Some(2));
        assert_eq!(last.last().map(|r| r.0), Some(6));
        assert_eq!(tail(&ds, 50).len(), 7);
    }

    #[test]
    fn describe_numeric_columns() {
        let rows = describe(&sample());
        assert_eq!(rows.len(), 1);
        let age = &rows[0];
        assert_eq!(age.column, "Age");
        assert_eq!(age.values[0], Some(7.0));
        assert_eq!(age.values[1], Some(4.0));
        assert_eq!(age.values[3], Some(1.0));
        assert_eq!(age.values[4], Some(2.5));
        assert_eq!(age.values[5], Some(4.0));
        assert_eq!(age.values[7], Some(7.0));
    }

    #[test]
    fn info_report() {
        let ds = sample();
        assert_eq!(missing_counts(&ds), vec![("Age".to_string(), 0), ("Name".to_string(), 6)]);

        let report = info(&ds).to_string();
        assert!(report.starts_with("RangeIndex: 7 entries, 0 to 6"));
        assert!(report.contains("int64"));
        assert!(report.ends_with("dtypes: int64(1), object(1)"));
    }
}
