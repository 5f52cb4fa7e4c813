use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Result, TableError};

use super::model::{Column, ColumnData, Dataset};

/// Default name of the exported table.
pub const EXPORT_FILE_NAME: &str = "df_modificado.csv";
/// MIME type of the exported table.
pub const EXPORT_MIME: &str = "text/csv";

/// Cell contents treated as missing on load.
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// A user-supplied file: its name (used to detect the format) and raw bytes.
#[derive(Debug, Clone)]
pub struct DataSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DataSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        DataSource {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a source from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(DataSource::new(name, bytes))
    }

    fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse a dataset from a source.  Dispatch by extension; only `.csv` is
/// supported.
pub fn load_source(source: &DataSource) -> Result<Dataset> {
    match source.extension().as_str() {
        "csv" => parse_csv(&source.bytes),
        "" => Err(TableError::UnsupportedFormat(format!(
            "'{}' has no file extension",
            source.name
        ))),
        other => Err(TableError::UnsupportedFormat(format!(".{other}"))),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: comma-delimited, header row with column names, every record
/// the same width as the header.
pub fn parse_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(TableError::MissingHeader);
    }
    let headers = dedup_headers(headers);

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result?;
        for (cells, field) in raw.iter_mut().zip(record.iter()) {
            cells.push(parse_cell(field));
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| Column::new(name, infer_column(cells)))
        .collect();

    Dataset::new(columns)
}

/// Repeated header names get a `.1`, `.2`, ... suffix so every column can
/// be addressed by name.
fn dedup_headers(headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = headers.iter().cloned().collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());

    for name in headers {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            names.push(name);
            continue;
        }
        let mut candidate = format!("{name}.{count}");
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{name}.{count}");
        }
        *count += 1;
        log::warn!("Duplicate column '{name}' renamed to '{candidate}'");
        taken.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

fn parse_cell(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(field.to_string())
    }
}

/// Pick the narrowest type that holds every present cell: integer (only
/// without gaps), then float, then text.
fn infer_column(cells: Vec<Option<String>>) -> ColumnData {
    let has_missing = cells.iter().any(|c| c.is_none());

    if !has_missing {
        let ints: Option<Vec<i64>> = cells
            .iter()
            .map(|c| c.as_deref().and_then(|s| s.trim().parse::<i64>().ok()))
            .collect();
        if let Some(ints) = ints {
            return ColumnData::Integer(ints);
        }
    }

    let floats: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|c| match c {
            None => Some(None),
            Some(s) => s.trim().parse::<f64>().ok().map(Some),
        })
        .collect();
    // An all-missing column carries no type information; keep it as text.
    if let Some(floats) = floats {
        if floats.iter().any(|f| f.is_some()) {
            return ColumnData::Float(floats);
        }
    }

    ColumnData::Text(cells)
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// Serialize the dataset as CSV: header row then one record per row.
pub fn write_csv<W: std::io::Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.columns().iter().map(|c| c.name.as_str()))?;
    for row in 0..dataset.len() {
        wtr.write_record(dataset.row(row).iter().map(|v| v.to_csv_field()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serialize the dataset to an in-memory CSV string.
pub fn to_csv_string(dataset: &Dataset) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf)?;
    String::from_utf8(buf).map_err(|e| TableError::Io(std::io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ColumnType, Value};

    const PEOPLE: &str = "Name,Age,Salary\nAna,15,1000.5\nLuis,25,\nSofia,40,3000\n";

    #[test]
    fn infers_column_types() {
        let ds = parse_csv(PEOPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column_names(), vec!["Name", "Age", "Salary"]);
        assert_eq!(ds.column("Name").unwrap().data.kind(), ColumnType::Text);
        assert_eq!(ds.column("Age").unwrap().data.kind(), ColumnType::Integer);
        assert_eq!(
            ds.column("Salary").unwrap().data,
            ColumnData::Float(vec![Some(1000.5), None, Some(3000.0)])
        );
    }

    #[test]
    fn integers_with_gaps_become_float() {
        let ds = parse_csv(b"Age\n1\nNaN\n3\n").unwrap();
        assert_eq!(
            ds.column("Age").unwrap().data,
            ColumnData::Float(vec![Some(1.0), None, Some(3.0)])
        );
    }

    #[test]
    fn rejects_non_csv_extension() {
        let source = DataSource::new("people.xlsx", PEOPLE);
        let err = load_source(&source).unwrap_err();
        assert!(matches!(err, TableError::UnsupportedFormat(_)));

        let source = DataSource::new("PEOPLE.CSV", PEOPLE);
        assert!(load_source(&source).is_ok());
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = parse_csv(b"a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, TableError::Csv(_)));
    }

    #[test]
    fn rejects_empty_source() {
        assert!(matches!(parse_csv(b""), Err(TableError::MissingHeader)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, PEOPLE).unwrap();

        let source = DataSource::from_path(&path).unwrap();
        assert_eq!(source.name, "people.csv");
        let ds = load_source(&source).unwrap();
        assert_eq!(ds.row(0)[0], Value::Text("Ana".into()));
    }

    #[test]
    fn duplicate_headers_are_renamed() {
        let ds = parse_csv(b"a,a,b,a\n1,5,x,7\n2,6,y,8\n").unwrap();
        assert_eq!(ds.column_names(), ["a", "a.1", "b", "a.2"]);
        assert_eq!(ds.column("a.1").unwrap().data, ColumnData::Integer(vec![5, 6]));

        let ds = parse_csv(b"a,a.1,a\n1,2,3\n").unwrap();
        assert_eq!(ds.column_names(), ["a", "a.1", "a.2"]);
    }

    #[test]
    fn whole_valued_floats_stay_float_after_export() {
        let ds = Dataset::new(vec![Column::new(
            "Salary",
            ColumnData::Float(vec![Some(900.0), Some(1800.0), Some(1e21)]),
        )])
        .unwrap();
        let text = to_csv_string(&ds).unwrap();
        assert_eq!(text, "Salary\n900.0\n1800.0\n1e21\n");
        assert_eq!(parse_csv(text.as_bytes()).unwrap(), ds);
    }

    #[test]
    fn export_reloads_to_same_table() {
        let ds = parse_csv(PEOPLE.as_bytes()).unwrap();
        let text = to_csv_string(&ds).unwrap();
        assert!(text.starts_with("Name,Age,Salary\n"));
        assert_eq!(parse_csv(text.as_bytes()).unwrap(), ds);
    }
}
