use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{Result, TableError};

/// Display and CSV format for timestamp cells.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Value – a single cell, dynamically typed
// ---------------------------------------------------------------------------

/// A single cell of the dataset, used when the column type is not known
/// statically (table rendering, CSV export).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Missing,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            Value::Missing => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Render the cell for CSV output. Floats keep full precision and
    /// always carry a fractional part or exponent, so a whole-valued float
    /// column reloads as float. Missing cells become empty fields.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Float(v) => format!("{v:?}"),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – the dtype of a whole column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Timestamp,
}

impl ColumnType {
    pub const ALL: [ColumnType; 4] = [
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Text,
        ColumnType::Timestamp,
    ];

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Human-readable label used in the type selector.
    pub fn label(self) -> &'static str {
        match self {
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::Text => "Text",
            ColumnType::Timestamp => "Timestamp",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Text => "object",
            ColumnType::Timestamp => "datetime64[ns]",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// ColumnData – homogeneous typed storage
// ---------------------------------------------------------------------------

/// Typed cell storage for one column. Integer columns cannot hold missing
/// cells; a numeric column with gaps is stored as `Float`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<i64>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnType {
        match self {
            ColumnData::Integer(_) => ColumnType::Integer,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Timestamp(_) => ColumnType::Timestamp,
        }
    }

    /// Cell at `row` as a dynamically typed value.
    pub fn get(&self, row: usize) -> Value {
        match self {
            ColumnData::Integer(v) => v.get(row).map_or(Value::Missing, |i| Value::Integer(*i)),
            ColumnData::Float(v) => match v.get(row) {
                Some(Some(x)) => Value::Float(*x),
                _ => Value::Missing,
            },
            ColumnData::Text(v) => match v.get(row) {
                Some(Some(s)) => Value::Text(s.clone()),
                _ => Value::Missing,
            },
            ColumnData::Timestamp(v) => match v.get(row) {
                Some(Some(t)) => Value::Timestamp(*t),
                _ => Value::Missing,
            },
        }
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Integer(_) => 0,
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Timestamp(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Numeric view of the column, `None` for missing cells.
    /// Returns `None` for non-numeric columns.
    pub fn as_numeric(&self) -> Option<Vec<Option<f64>>> {
        match self {
            ColumnData::Integer(v) => Some(v.iter().map(|&i| Some(i as f64)).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }
}

/// The full loaded table: named columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, |c| c.data.len());
        if let Some(bad) = columns.iter().find(|c| c.data.len() != rows) {
            return Err(TableError::LengthMismatch {
                column: bad.name.clone(),
                expected: rows,
                actual: bad.data.len(),
            });
        }
        Ok(Dataset { columns, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.data.is_empty())
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of the integer and float columns, in table order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.data.kind().is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// Numeric view of a column; fails if the column is absent or not numeric.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        column
            .data
            .as_numeric()
            .ok_or_else(|| TableError::NotNumeric {
                column: name.to_string(),
                kind: column.data.kind().label().to_ascii_lowercase(),
            })
    }

    /// Swap in new storage for a column. The replacement must keep the row
    /// count, otherwise nothing changes.
    pub fn replace_data(&mut self, name: &str, data: ColumnData) -> Result<()> {
        if data.len() != self.rows {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows,
                actual: data.len(),
            });
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
        column.data = data;
        Ok(())
    }

    /// All cells of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.data.get(index)).collect()
    }
}

/// Drop missing cells from a numeric view.
pub fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new("Age", ColumnData::Integer(vec![15, 25, 40])),
            Column::new("Salary", ColumnData::Float(vec![Some(1.5), None, Some(3.0)])),
            Column::new(
                "Name",
                ColumnData::Text(vec![Some("a".into()), Some("b".into()), None]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::new("a", ColumnData::Integer(vec![1, 2])),
            Column::new("b", ColumnData::Integer(vec![1])),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn numeric_view_checks_type() {
        let ds = sample();
        assert_eq!(ds.numeric("Age").unwrap(), vec![Some(15.0), Some(25.0), Some(40.0)]);
        assert!(matches!(ds.numeric("Name"), Err(TableError::NotNumeric { .. })));
        assert!(matches!(ds.numeric("Height"), Err(TableError::ColumnNotFound(_))));
        assert_eq!(ds.numeric_column_names(), vec!["Age", "Salary"]);
    }

    #[test]
    fn replace_keeps_row_count() {
        let mut ds = sample();
        let err = ds
            .replace_data("Age", ColumnData::Integer(vec![1]))
            .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { .. }));
        assert_eq!(ds, sample());

        ds.replace_data("Age", ColumnData::Integer(vec![1, 2, 3])).unwrap();
        assert_eq!(ds.column("Age").unwrap().data, ColumnData::Integer(vec![1, 2, 3]));
    }

    #[test]
    fn rows_and_missing_cells() {
        let ds = sample();
        assert_eq!(
            ds.row(1),
            vec![Value::Integer(25), Value::Missing, Value::Text("b".into())]
        );
        assert_eq!(ds.column("Salary").unwrap().data.missing_count(), 1);
        assert_eq!(Value::Missing.to_csv_field(), "");
        assert_eq!(Value::Float(0.125).to_csv_field(), "0.125");
        assert_eq!(Value::Float(900.0).to_csv_field(), "900.0");
        assert!(!ds.is_empty());
        assert!(Dataset::new(vec![Column::new("x", ColumnData::Float(Vec::new()))])
            .unwrap()
            .is_empty());
    }
}
