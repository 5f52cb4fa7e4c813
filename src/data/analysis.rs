//! Read-only statistics over a [`Dataset`]: central tendency, dispersion,
//! outliers, correlation, and the numbers behind every chart.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Result, TableError};

use super::model::{present, Dataset};

pub const DEFAULT_OUTLIER_FACTOR: f64 = 1.5;

/// Whisker reach of box plots, in IQRs.
const WHISKER_FACTOR: f64 = 1.5;

/// Number of points of a density curve.
const KDE_POINTS: usize = 200;

const MAX_BINS: usize = 500;

/// statistic name → column name → value
pub type StatTable = BTreeMap<String, BTreeMap<String, Option<f64>>>;

// ---------------------------------------------------------------------------
// Scalar statistics over present values
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(&sorted(values), 0.5)
}

/// Most frequent value; among ties the smallest.
pub fn mode(values: &[f64]) -> Option<f64> {
    let sorted = sorted(values);
    let mut best: Option<(f64, usize)> = None;
    for run in sorted.chunk_by(|a, b| a == b) {
        if best.map_or(true, |(_, count)| run.len() > count) {
            best = Some((run[0], run.len()));
        }
    }
    best.map(|(value, _)| value)
}

/// Quantile of already sorted values, linear interpolation between the
/// closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Sample variance (n − 1 denominator); needs at least two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

// ---------------------------------------------------------------------------
// Central tendency / dispersion
// ---------------------------------------------------------------------------

/// Mean, median and mode of every numeric column.
pub fn central_tendency(dataset: &Dataset) -> StatTable {
    let mut table = StatTable::new();
    for name in dataset.numeric_column_names() {
        let values = dataset.numeric(&name).map(|v| present(&v)).unwrap_or_default();
        let stats = [
            ("mean", mean(&values)),
            ("median", median(&values)),
            ("mode", mode(&values)),
        ];
        for (stat, value) in stats {
            table
                .entry(stat.to_string())
                .or_default()
                .insert(name.clone(), value);
        }
    }
    table
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    pub std_dev: Option<f64>,
    pub variance: Option<f64>,
    pub range: Option<f64>,
}

/// Spread of one numeric column.
pub fn dispersion(dataset: &Dataset, column: &str) -> Result<Dispersion> {
    let values = present(&dataset.numeric(column)?);
    Ok(Dispersion {
        std_dev: sample_std(&values),
        variance: sample_variance(&values),
        range: min_max(&values).map(|(min, max)| max - min),
    })
}

// ---------------------------------------------------------------------------
// Quartiles, outliers, box plot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn of(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        Some(Quartiles {
            q1: quantile(&sorted, 0.25)?,
            median: quantile(&sorted, 0.5)?,
            q3: quantile(&sorted, 0.75)?,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// `[Q1 − factor·IQR, Q3 + factor·IQR]`
    pub fn fences(&self, factor: f64) -> (f64, f64) {
        (self.q1 - factor * self.iqr(), self.q3 + factor * self.iqr())
    }
}

/// Values of `column` outside the IQR fences, in row order.
pub fn outliers(dataset: &Dataset, column: &str, factor: f64) -> Result<Vec<f64>> {
    let values = present(&dataset.numeric(column)?);
    let Some(quartiles) = Quartiles::of(&values) else {
        return Ok(Vec::new());
    };
    let (low, high) = quartiles.fences(factor);
    Ok(values.into_iter().filter(|&v| v < low || v > high).collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotStats {
    pub quartiles: Quartiles,
    /// Lowest value inside the lower fence.
    pub whisker_low: f64,
    /// Highest value inside the upper fence.
    pub whisker_high: f64,
    pub fliers: Vec<f64>,
}

/// Box-and-whisker summary of one column; `None` when it has no values.
pub fn box_plot(dataset: &Dataset, column: &str) -> Result<Option<BoxPlotStats>> {
    let values = present(&dataset.numeric(column)?);
    let Some(quartiles) = Quartiles::of(&values) else {
        return Ok(None);
    };
    let (low, high) = quartiles.fences(WHISKER_FACTOR);
    let (inside, fliers): (Vec<f64>, Vec<f64>) =
        values.iter().partition(|&&v| v >= low && v <= high);
    // The quartiles always lie inside the fences, so `inside` is never empty.
    let (whisker_low, whisker_high) =
        min_max(&inside).unwrap_or((quartiles.q1, quartiles.q3));
    Ok(Some(BoxPlotStats {
        quartiles,
        whisker_low,
        whisker_high,
        fliers,
    }))
}

// ---------------------------------------------------------------------------
// Histograms with density estimate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub column: String,
    /// `counts.len() + 1` ascending bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Gaussian KDE scaled to the count axis; empty when the values have no
    /// spread.
    pub density: Vec<[f64; 2]>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Build a histogram of `values`, binned with the smaller of the Sturges
    /// and Freedman–Diaconis widths.
    pub fn of(column: &str, values: &[f64], with_density: bool) -> Option<Self> {
        let (low, high) = min_max(values)?;
        let n = values.len() as f64;

        let sturges = (high - low) / (n.log2() + 1.0);
        let iqr = Quartiles::of(values).map_or(0.0, |q| q.iqr());
        let fd = 2.0 * iqr / n.cbrt();
        let width = if fd > 0.0 { fd.min(sturges) } else { sturges };

        let (first, last) = if high > low { (low, high) } else { (low - 0.5, high + 0.5) };
        let span = last - first;
        let bins = if width > 0.0 {
            ((span / width).ceil() as usize).clamp(1, MAX_BINS)
        } else {
            1
        };
        let width = span / bins as f64;

        let edges: Vec<f64> = (0..=bins).map(|i| first + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for &v in values {
            let idx = (((v - first) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let density = if with_density {
            kde_curve(values, first, last, width)
        } else {
            Vec::new()
        };

        Some(Histogram {
            column: column.to_string(),
            edges,
            counts,
            density,
        })
    }
}

/// Gaussian KDE with Scott's bandwidth, evaluated over `[start, end]` and
/// scaled so its area matches a histogram with bins of `bin_width`.
fn kde_curve(values: &[f64], start: f64, end: f64, bin_width: f64) -> Vec<[f64; 2]> {
    let n = values.len() as f64;
    let Some(std) = sample_std(values).filter(|s| *s > 0.0) else {
        return Vec::new();
    };
    let bandwidth = std * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (end - start) / (KDE_POINTS - 1) as f64;

    (0..KDE_POINTS)
        .map(|i| {
            let x = start + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            [x, density * n * bin_width]
        })
        .collect()
}

/// One histogram per selected column. An empty selection yields nothing.
pub fn histograms(dataset: &Dataset, columns: &[String]) -> Result<Vec<Histogram>> {
    if columns.is_empty() {
        log::warn!("No columns selected for histograms");
        return Ok(Vec::new());
    }
    let mut out = Vec::with_capacity(columns.len());
    for name in columns {
        let values = present(&dataset.numeric(name)?);
        if let Some(hist) = Histogram::of(name, &values, true) {
            out.push(hist);
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 2] = [CorrelationMethod::Pearson, CorrelationMethod::Spearman];

    pub fn name(self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            other => Err(TableError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Square matrix of pairwise coefficients. `None` where a pair has fewer
/// than two complete rows or no variance.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Rows where both cells are present.
fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    let denom = (sxx * syy).sqrt();
    (denom > 0.0).then(|| (sxy / denom).clamp(-1.0, 1.0))
}

/// 1-based ranks, ties get the average of the ranks they span.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]].total_cmp(&values[order[start]]) == Ordering::Equal {
            end += 1;
        }
        let avg = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    pearson(&ranks(x), &ranks(y))
}

fn correlate(dataset: &Dataset, method: CorrelationMethod) -> CorrelationMatrix {
    let columns = dataset.numeric_column_names();
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| dataset.numeric(c).unwrap_or_default())
        .collect();

    let values = data
        .iter()
        .map(|x| {
            data.iter()
                .map(|y| {
                    let (a, b) = complete_pairs(x, y);
                    match method {
                        CorrelationMethod::Pearson => pearson(&a, &b),
                        CorrelationMethod::Spearman => spearman(&a, &b),
                    }
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        method,
        columns,
        values,
    }
}

/// Pearson correlation of every pair of numeric columns.
pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
    correlate(dataset, CorrelationMethod::Pearson)
}

/// Correlation matrix by method name (`pearson` or `spearman`).
pub fn correlation_test(dataset: &Dataset, method: &str) -> Result<CorrelationMatrix> {
    let method = method.parse::<CorrelationMethod>()?;
    Ok(correlate(dataset, method))
}

// ---------------------------------------------------------------------------
// Pair grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PairCell {
    /// Diagonal: distribution of the column.
    Histogram(Histogram),
    /// Off-diagonal: `(x, y)` points of rows where both cells are present.
    Scatter(Vec<[f64; 2]>),
    Empty,
}

/// All-pairs grid over the numeric columns. `cells[row][col]` plots column
/// `col` on x against column `row` on y.
#[derive(Debug, Clone, PartialEq)]
pub struct PairGrid {
    pub columns: Vec<String>,
    pub cells: Vec<Vec<PairCell>>,
}

pub fn pair_grid(dataset: &Dataset) -> PairGrid {
    let columns = dataset.numeric_column_names();
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| dataset.numeric(c).unwrap_or_default())
        .collect();

    let cells = (0..columns.len())
        .map(|row| {
            (0..columns.len())
                .map(|col| {
                    if row == col {
                        Histogram::of(&columns[col], &present(&data[col]), false)
                            .map_or(PairCell::Empty, PairCell::Histogram)
                    } else {
                        let (x, y) = complete_pairs(&data[col], &data[row]);
                        PairCell::Scatter(x.into_iter().zip(y).map(|(a, b)| [a, b]).collect())
                    }
                })
                .collect()
        })
        .collect();

    PairGrid { columns, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, ColumnData};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn people() -> Dataset {
        Dataset::new(vec![
            Column::new("Age", ColumnData::Integer(vec![20, 30, 30, 40, 40, 50])),
            Column::new(
                "Salary",
                ColumnData::Float(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(100.0)]),
            ),
            Column::new(
                "Name",
                ColumnData::Text(vec![None, None, None, None, None, Some("x".into())]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn central_tendency_covers_numeric_columns() {
        let table = central_tendency(&people());
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["mean", "median", "mode"]);
        assert_eq!(table["mean"]["Age"], Some(35.0));
        assert_eq!(table["median"]["Age"], Some(35.0));
        // 30 and 40 both appear twice; the lower one wins
        assert_eq!(table["mode"]["Age"], Some(30.0));
        assert_eq!(table["mode"]["Salary"], Some(1.0));
        assert!(!table["mean"].contains_key("Name"));
    }

    #[test]
    fn dispersion_of_one_column() {
        let ds = Dataset::new(vec![Column::new("x", ColumnData::Integer(vec![2, 4, 4, 4, 5, 5, 7, 9]))]).unwrap();
        let d = dispersion(&ds, "x").unwrap();
        assert!(close(d.variance.unwrap(), 32.0 / 7.0));
        assert!(close(d.std_dev.unwrap(), (32.0f64 / 7.0).sqrt()));
        assert_eq!(d.range, Some(7.0));
        assert!(matches!(dispersion(&people(), "Name"), Err(TableError::NotNumeric { .. })));
    }

    #[test]
    fn iqr_rule_flags_the_outlier() {
        let flagged = outliers(&people(), "Salary", DEFAULT_OUTLIER_FACTOR).unwrap();
        assert_eq!(flagged, vec![100.0]);
        assert!(outliers(&people(), "Salary", 100.0).unwrap().is_empty());
    }

    #[test]
    fn quartiles_interpolate() {
        let q = Quartiles::of(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert!(close(q.q1, 2.25));
        assert!(close(q.median, 3.5));
        assert!(close(q.q3, 4.75));
        assert!(Quartiles::of(&[]).is_none());
    }

    #[test]
    fn box_plot_splits_fliers() {
        let stats = box_plot(&people(), "Salary").unwrap().unwrap();
        assert_eq!(stats.fliers, vec![100.0]);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 5.0);
    }

    #[test]
    fn spearman_beats_pearson_on_monotonic_curve() {
        let x: Vec<i64> = (1..=10).collect();
        let y: Vec<Option<f64>> = x.iter().map(|&v| Some((v as f64).exp())).collect();
        let ds = Dataset::new(vec![
            Column::new("x", ColumnData::Integer(x)),
            Column::new("y", ColumnData::Float(y)),
        ])
        .unwrap();

        let p = correlation_test(&ds, "pearson").unwrap().get("x", "y").unwrap();
        let s = correlation_test(&ds, "spearman").unwrap().get("x", "y").unwrap();
        assert!(close(s, 1.0));
        assert!(s > p);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = correlation_test(&people(), "kendall").unwrap_err();
        assert!(matches!(err, TableError::UnsupportedMethod(m) if m == "kendall"));
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let m = correlation_matrix(&people());
        assert_eq!(m.columns, vec!["Age", "Salary"]);
        assert_eq!(m.method, CorrelationMethod::Pearson);
        assert!(close(m.get("Age", "Age").unwrap(), 1.0));
        assert_eq!(m.get("Age", "Salary"), m.get("Salary", "Age"));
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| (i % 17) as f64).collect();
        let hist = Histogram::of("v", &values, true).unwrap();
        assert_eq!(hist.counts.iter().sum::<usize>(), 100);
        assert_eq!(hist.edges.len(), hist.counts.len() + 1);
        assert_eq!(hist.density.len(), KDE_POINTS);

        let flat = Histogram::of("v", &[3.0, 3.0], true).unwrap();
        assert_eq!(flat.counts, vec![2]);
        assert!(flat.density.is_empty());
    }

    #[test]
    fn empty_histogram_selection() {
        assert!(histograms(&people(), &[]).unwrap().is_empty());
        assert_eq!(histograms(&people(), &["Age".to_string()]).unwrap().len(), 1);
    }

    #[test]
    fn pair_grid_layout() {
        let grid = pair_grid(&people());
        assert_eq!(grid.columns.len(), 2);
        assert!(matches!(grid.cells[0][0], PairCell::Histogram(_)));
        match &grid.cells[0][1] {
            PairCell::Scatter(points) => assert_eq!(points[0], [1.0, 20.0]),
            other => panic!("expected scatter, got {other:?}"),
        }
    }
}
