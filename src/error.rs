use thiserror::Error;

/// Failures of table loading, cleaning, and analysis.
///
/// Every operation that returns one of these leaves the dataset exactly as it
/// was before the call.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Column '{column}' is {kind}, not numeric")]
    NotNumeric { column: String, kind: String },

    #[error("Conversion of column '{column}' failed: {reason}")]
    ConversionFailure { column: String, reason: String },

    #[error("Unsupported correlation method '{0}': use 'pearson' or 'spearman'")]
    UnsupportedMethod(String),

    #[error("CSV source has no header row")]
    MissingHeader,

    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub(crate) fn conversion(column: &str, reason: impl Into<String>) -> Self {
        TableError::ConversionFailure {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
