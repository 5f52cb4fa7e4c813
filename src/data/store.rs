use crate::error::Result;

use super::loader::{self, DataSource};
use super::model::Dataset;

/// Owner of the single active dataset of a session.
///
/// Cleaning operations borrow it mutably, analysis operations immutably; a
/// second session gets its own store.
#[derive(Debug, Default)]
pub struct TableStore {
    dataset: Option<Dataset>,
    source_name: Option<String>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` and make it the active dataset. On failure the
    /// previously loaded dataset stays in place.
    pub fn load(&mut self, source: &DataSource) -> Result<&Dataset> {
        let dataset = loader::load_source(source)?;
        log::info!(
            "Loaded '{}': {} rows, columns {:?}",
            source.name,
            dataset.len(),
            dataset.column_names()
        );
        self.source_name = Some(source.name.clone());
        Ok(self.dataset.insert(dataset))
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn dataset_mut(&mut self) -> Option<&mut Dataset> {
        self.dataset.as_mut()
    }

    /// File name of the loaded source, if any.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    /// The current dataset as CSV text, ready for download.
    pub fn export_csv(&self) -> Option<Result<String>> {
        self.dataset.as_ref().map(loader::to_csv_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::{self, CurrencyConversion};
    use crate::error::TableError;

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut store = TableStore::new();
        assert!(!store.is_loaded());

        store
            .load(&DataSource::new("a.csv", "x\n1\n2\n"))
            .unwrap();
        let before = store.dataset().cloned();

        let err = store
            .load(&DataSource::new("a.json", "[1, 2]"))
            .unwrap_err();
        assert!(matches!(err, TableError::UnsupportedFormat(_)));
        assert_eq!(store.dataset().cloned(), before);
        assert_eq!(store.source_name(), Some("a.csv"));

        assert!(store.load(&DataSource::new("b.csv", "x,y\n1\n")).is_err());
        assert_eq!(store.dataset().cloned(), before);
    }

    #[test]
    fn load_replaces_dataset() {
        let mut store = TableStore::new();
        store.load(&DataSource::new("a.csv", "x\n1\n")).unwrap();
        store.load(&DataSource::new("b.csv", "y,z\n1,2\n3,4\n")).unwrap();

        let ds = store.dataset().unwrap();
        assert_eq!(ds.column_names(), vec!["y", "z"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(store.export_csv().unwrap().unwrap(), "y,z\n1,2\n3,4\n");
    }

    #[test]
    fn converted_column_reloads_as_float() {
        let mut store = TableStore::new();
        store.load(&DataSource::new("pay.csv", "Salary\n1\n2\n")).unwrap();
        let ds = store.dataset_mut().unwrap();
        clean::convert_currency(ds, "Salary", CurrencyConversion::UsdToClp, 900.0).unwrap();
        let before = store.dataset().unwrap().clone();

        let text = store.export_csv().unwrap().unwrap();
        assert_eq!(text, "Salary\n900.0\n1800.0\n");
        store.load(&DataSource::new("pay.csv", text)).unwrap();
        assert_eq!(store.dataset().unwrap(), &before);
    }
}
