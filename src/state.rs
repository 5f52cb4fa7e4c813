use std::path::Path;

use anyhow::Context;

use crate::config::Settings;
use crate::data::analysis::{
    self, BoxPlotStats, CorrelationMatrix, CorrelationMethod, Dispersion, Histogram, PairGrid,
    StatTable,
};
use crate::data::clean::{self, ClampBounds, CurrencyConversion};
use crate::data::loader::DataSource;
use crate::data::model::{ColumnType, Dataset};
use crate::data::store::TableStore;

// ---------------------------------------------------------------------------
// Pages and status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Cleaning,
    Analysis,
    Summary,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Cleaning, Page::Analysis, Page::Summary];

    pub fn title(self) -> &'static str {
        match self {
            Page::Cleaning => "Data cleaning",
            Page::Analysis => "Data analysis",
            Page::Summary => "Data summary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Control values
// ---------------------------------------------------------------------------

/// Parameters of the cleaning sidebar.
#[derive(Debug, Clone)]
pub struct CleaningControls {
    pub impute_column: Option<String>,
    pub type_column: Option<String>,
    pub target_type: ColumnType,
    pub currency_column: Option<String>,
    pub conversion: CurrencyConversion,
    pub clamp_column: Option<String>,
    pub bounds: ClampBounds,
}

/// Which analysis sections are shown, and their parameters.
#[derive(Debug, Clone)]
pub struct AnalysisControls {
    pub show_central: bool,
    pub show_dispersion: bool,
    pub show_histograms: bool,
    pub histogram_columns: Vec<String>,
    pub show_outliers: bool,
    pub show_box_plot: bool,
    pub show_correlation: bool,
    pub show_pairs: bool,
    pub show_correlation_test: bool,
    pub method: CorrelationMethod,
    /// Column used by dispersion, outliers and the box plot.
    pub target_column: Option<String>,
    pub outlier_factor: f64,
}

/// Analysis results, computed on demand and dropped whenever the data or
/// the controls change. Errors are kept as display text.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    pub central: Option<StatTable>,
    pub dispersion: Option<Result<Dispersion, String>>,
    pub histograms: Option<Result<Vec<Histogram>, String>>,
    pub outliers: Option<Result<Vec<f64>, String>>,
    pub box_plot: Option<Result<Option<BoxPlotStats>, String>>,
    pub correlation: Option<CorrelationMatrix>,
    pub pairs: Option<PairGrid>,
    pub correlation_test: Option<Result<CorrelationMatrix, String>>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,
    pub store: TableStore,
    pub page: Page,
    pub cleaning: CleaningControls,
    pub analysis: AnalysisControls,
    pub cache: AnalysisCache,
    /// Status / error message shown in the UI.
    pub status: Option<Status>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let cleaning = CleaningControls {
            impute_column: None,
            type_column: None,
            target_type: ColumnType::Float,
            currency_column: None,
            conversion: CurrencyConversion::UsdToClp,
            clamp_column: None,
            bounds: settings.clamp_bounds(),
        };
        let analysis = AnalysisControls {
            show_central: false,
            show_dispersion: false,
            show_histograms: false,
            histogram_columns: Vec::new(),
            show_outliers: false,
            show_box_plot: false,
            show_correlation: false,
            show_pairs: false,
            show_correlation_test: false,
            method: CorrelationMethod::Pearson,
            target_column: None,
            outlier_factor: settings.outlier_factor,
        };
        Self {
            settings,
            store: TableStore::new(),
            page: Page::Cleaning,
            cleaning,
            analysis,
            cache: AnalysisCache::default(),
            status: None,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.store.dataset()
    }

    fn set_status(&mut self, kind: StatusKind, text: String) {
        match kind {
            StatusKind::Error => log::error!("{text}"),
            StatusKind::Warning => log::warn!("{text}"),
            StatusKind::Success => log::info!("{text}"),
        }
        self.status = Some(Status { kind, text });
    }

    /// Load a new source into the store and reset column selections.
    pub fn open_source(&mut self, source: &DataSource) {
        match self.store.load(source) {
            Ok(dataset) => {
                let rows = dataset.len();
                self.reset_selections();
                self.set_status(
                    StatusKind::Success,
                    format!("Loaded '{}' ({rows} rows)", source.name),
                );
            }
            Err(e) => {
                self.set_status(StatusKind::Error, format!("Could not load '{}': {e}", source.name));
            }
        }
    }

    /// Point every column selector at a column of the current dataset.
    fn reset_selections(&mut self) {
        let Some(ds) = self.store.dataset() else {
            return;
        };
        let numeric = ds.numeric_column_names();
        let first_numeric = numeric.first().cloned();
        let target = numeric
            .iter()
            .find(|c| **c == self.settings.analysis_column)
            .cloned()
            .or_else(|| first_numeric.clone());

        self.cleaning.impute_column = first_numeric.clone();
        self.cleaning.type_column = ds.column_names().first().cloned();
        self.cleaning.currency_column = first_numeric.clone();
        self.cleaning.clamp_column = first_numeric;
        self.analysis.histogram_columns = numeric;
        self.analysis.target_column = target;
        self.invalidate_analysis();
    }

    pub fn invalidate_analysis(&mut self) {
        self.cache = AnalysisCache::default();
    }

    /// Run one cleaning operation against the loaded dataset and report the
    /// outcome in the status line.
    fn run_cleaning<T>(
        &mut self,
        column: Option<String>,
        op: impl FnOnce(&mut Dataset, &str) -> crate::error::Result<T>,
        describe: impl FnOnce(&str, T) -> String,
    ) {
        let Some(column) = column else {
            self.set_status(StatusKind::Warning, "Select a column first".to_owned());
            return;
        };
        let Some(dataset) = self.store.dataset_mut() else {
            self.set_status(StatusKind::Warning, "Load a CSV file first".to_owned());
            return;
        };
        match op(dataset, &column) {
            Ok(out) => {
                let text = describe(&column, out);
                self.set_status(StatusKind::Success, text);
            }
            Err(e) => self.set_status(StatusKind::Error, e.to_string()),
        }
        self.invalidate_analysis();
        // Type changes can move a column in or out of the numeric selectors.
        self.retain_valid_selections();
    }

    fn retain_valid_selections(&mut self) {
        let Some(ds) = self.store.dataset() else {
            return;
        };
        let numeric = ds.numeric_column_names();
        let keep = |sel: &mut Option<String>| {
            if sel.as_ref().is_some_and(|c| !numeric.contains(c)) {
                *sel = numeric.first().cloned();
            }
        };
        keep(&mut self.cleaning.impute_column);
        keep(&mut self.cleaning.currency_column);
        keep(&mut self.cleaning.clamp_column);
        keep(&mut self.analysis.target_column);
        self.analysis.histogram_columns.retain(|c| numeric.contains(c));
    }

    pub fn impute(&mut self) {
        self.run_cleaning(
            self.cleaning.impute_column.clone(),
            clean::impute_mean,
            |col, n| format!("Replaced {n} missing values of '{col}' with its mean"),
        );
    }

    pub fn change_type(&mut self) {
        let target = self.cleaning.target_type;
        self.run_cleaning(
            self.cleaning.type_column.clone(),
            |ds, col| clean::change_type(ds, col, target),
            |col, ()| format!("Column '{col}' changed to {}", target.label()),
        );
    }

    pub fn convert_currency(&mut self) {
        let conversion = self.cleaning.conversion;
        let rate = self.settings.exchange_rate;
        self.run_cleaning(
            self.cleaning.currency_column.clone(),
            |ds, col| clean::convert_currency(ds, col, conversion, rate),
            |col, ()| format!("Column '{col}' converted ({conversion})"),
        );
    }

    pub fn clamp(&mut self) {
        let bounds = self.cleaning.bounds;
        self.run_cleaning(
            self.cleaning.clamp_column.clone(),
            |ds, col| clean::clamp_range(ds, col, bounds),
            |col, n| {
                format!(
                    "Replaced {n} values of '{col}' outside {}-{} with the mean",
                    bounds.min, bounds.max
                )
            },
        );
    }

    /// Write the current dataset as CSV to `path`.
    pub fn export_to(&mut self, path: &Path) -> anyhow::Result<()> {
        let csv = self
            .store
            .export_csv()
            .context("no dataset loaded")?
            .context("serializing dataset")?;
        std::fs::write(path, csv).with_context(|| format!("writing {}", path.display()))?;
        self.set_status(StatusKind::Success, format!("Saved {}", path.display()));
        Ok(())
    }

    pub fn report_error(&mut self, err: &anyhow::Error) {
        self.set_status(StatusKind::Error, format!("Error: {err:#}"));
    }

    /// Fill the cache for every enabled analysis section.
    pub fn refresh_analysis(&mut self) {
        let Some(ds) = self.store.dataset() else {
            return;
        };
        let ctl = &self.analysis;
        let cache = &mut self.cache;
        let target = ctl.target_column.as_deref();

        if ctl.show_central && cache.central.is_none() {
            cache.central = Some(analysis::central_tendency(ds));
        }
        if ctl.show_dispersion && cache.dispersion.is_none() {
            cache.dispersion = Some(on_target(target, |c| analysis::dispersion(ds, c)));
        }
        if ctl.show_histograms && cache.histograms.is_none() {
            cache.histograms =
                Some(analysis::histograms(ds, &ctl.histogram_columns).map_err(|e| e.to_string()));
        }
        if ctl.show_outliers && cache.outliers.is_none() {
            cache.outliers =
                Some(on_target(target, |c| analysis::outliers(ds, c, ctl.outlier_factor)));
        }
        if ctl.show_box_plot && cache.box_plot.is_none() {
            cache.box_plot = Some(on_target(target, |c| analysis::box_plot(ds, c)));
        }
        if ctl.show_correlation && cache.correlation.is_none() {
            cache.correlation = Some(analysis::correlation_matrix(ds));
        }
        if ctl.show_pairs && cache.pairs.is_none() {
            cache.pairs = Some(analysis::pair_grid(ds));
        }
        if ctl.show_correlation_test && cache.correlation_test.is_none() {
            cache.correlation_test = Some(
                analysis::correlation_test(ds, ctl.method.name()).map_err(|e| e.to_string()),
            );
        }
    }
}

/// Run an analysis on the selected target column, keeping errors as text.
fn on_target<T>(
    target: Option<&str>,
    f: impl FnOnce(&str) -> crate::error::Result<T>,
) -> Result<T, String> {
    match target {
        Some(col) => f(col).map_err(|e| e.to_string()),
        None => Err("Select a numeric column".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnData;

    const PEOPLE: &str = "Name,Age,Salary\nAna,15,1000\nLuis,25,\nSofia,40,3000\nIvan,75,2000\n";

    fn loaded() -> AppState {
        let mut state = AppState::new(Settings::default());
        state.open_source(&DataSource::new("people.csv", PEOPLE));
        state
    }

    #[test]
    fn open_selects_columns() {
        let state = loaded();
        assert_eq!(state.status.as_ref().map(|s| s.kind), Some(StatusKind::Success));
        assert_eq!(state.analysis.target_column.as_deref(), Some("Salary"));
        assert_eq!(state.cleaning.impute_column.as_deref(), Some("Age"));
        assert_eq!(state.analysis.histogram_columns, vec!["Age", "Salary"]);
    }

    #[test]
    fn failed_open_reports_error() {
        let mut state = loaded();
        state.open_source(&DataSource::new("people.txt", "x"));
        assert_eq!(state.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
        assert_eq!(state.dataset().map(Dataset::len), Some(4));
    }

    #[test]
    fn cleaning_updates_dataset_and_status() {
        let mut state = loaded();
        state.clamp();
        assert_eq!(
            state.dataset().unwrap().column("Age").unwrap().data,
            ColumnData::Integer(vec![39, 25, 40, 39])
        );

        state.cleaning.impute_column = Some("Salary".to_owned());
        state.impute();
        assert_eq!(state.dataset().unwrap().column("Salary").unwrap().data.missing_count(), 0);

        state.cleaning.type_column = Some("Name".to_owned());
        state.cleaning.target_type = ColumnType::Integer;
        state.change_type();
        assert_eq!(state.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
    }

    #[test]
    fn type_change_drops_stale_selections() {
        let mut state = loaded();
        state.cleaning.type_column = Some("Salary".to_owned());
        state.cleaning.target_type = ColumnType::Text;
        state.change_type();
        assert_eq!(state.analysis.target_column.as_deref(), Some("Age"));
        assert_eq!(state.analysis.histogram_columns, vec!["Age"]);
    }

    #[test]
    fn analysis_is_cached_until_invalidated() {
        let mut state = loaded();
        state.analysis.show_outliers = true;
        state.analysis.show_central = true;
        state.refresh_analysis();
        assert_eq!(state.cache.outliers, Some(Ok(Vec::new())));
        assert!(state.cache.central.is_some());
        assert!(state.cache.pairs.is_none());

        state.clamp();
        assert!(state.cache.central.is_none());
    }

    #[test]
    fn export_writes_csv() {
        let mut state = loaded();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(crate::data::loader::EXPORT_FILE_NAME);
        state.export_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Name,Age,Salary\n"));
        assert_eq!(text.lines().count(), 5);
    }
}
