use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::analysis::DEFAULT_OUTLIER_FACTOR;
use crate::data::clean::{ClampBounds, DEFAULT_EXCHANGE_RATE};
use crate::data::loader::EXPORT_FILE_NAME;

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "TIDY_PANDA_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "tidy-panda.json";

/// User-tunable defaults. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// CLP per USD.
    pub exchange_rate: f64,
    pub min_age: f64,
    pub max_age: f64,
    pub outlier_factor: f64,
    /// Rows shown by the head/tail previews.
    pub preview_rows: usize,
    /// Column pre-selected for dispersion, outliers and the box plot.
    pub analysis_column: String,
    pub export_file_name: String,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        let bounds = ClampBounds::default();
        Self {
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            min_age: bounds.min,
            max_age: bounds.max,
            outlier_factor: DEFAULT_OUTLIER_FACTOR,
            preview_rows: 5,
            analysis_column: "Salary".to_owned(),
            export_file_name: EXPORT_FILE_NAME.to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl Settings {
    /// Settings file location: `$TIDY_PANDA_CONFIG`, else `tidy-panda.json`
    /// in the working directory.
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))
    }

    pub fn clamp_bounds(&self) -> ClampBounds {
        ClampBounds {
            min: self.min_age,
            max: self.max_age,
        }
    }
}
