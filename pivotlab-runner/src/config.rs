//! Serializable analysis configuration, loaded from TOML.
//!
//! ```toml
//! [data]
//! paths = ["data/NQ_daily.csv"]
//! format = "csv"
//!
//! [levels]
//! range_windows = [1, 3]
//! expected_move_lookbacks = [21, 9]
//! skew = true
//!
//! [stats]
//! year = 2025
//! per_year = false
//!
//! [output]
//! dir = "results"
//! parquet = false
//! ```
//!
//! Every section and field is optional; missing values take the defaults below.
//! Parsing checks the level settings only, so CLI flags can still supply
//! input paths before [`AnalysisConfig::validate`] runs.

use pivotlab_core::data::DataFormat;
use pivotlab_core::levels::RangeWindow;
use pivotlab_core::LevelMethod;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data: DataConfig,
    pub levels: LevelsConfig,
    pub stats: StatsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    /// Files or directories of daily bars.
    pub paths: Vec<PathBuf>,
    pub format: DataFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    pub range_windows: Vec<RangeWindow>,
    pub expected_move_lookbacks: Vec<usize>,
    pub skew: bool,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            range_windows: vec![RangeWindow::OneDay, RangeWindow::ThreeDay],
            expected_move_lookbacks: vec![21],
            skew: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatsConfig {
    /// Restrict the headline statistics to one calendar year.
    pub year: Option<i32>,
    /// Also produce statistics for every calendar year present.
    pub per_year: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Also write the level table as Parquet.
    pub parquet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            parquet: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate_levels()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Full validation for a run over files: level settings plus input paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_levels()?;
        if self.data.paths.is_empty() {
            return Err(ConfigError::Invalid("no input paths configured".into()));
        }
        Ok(())
    }

    /// Reject level settings that cannot produce any statistics.
    pub fn validate_levels(&self) -> Result<(), ConfigError> {
        if self.levels.range_windows.is_empty() && self.levels.expected_move_lookbacks.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one range window or expected-move lookback is required".into(),
            ));
        }
        if let Some(zero) = self.levels.expected_move_lookbacks.iter().find(|l| **l == 0) {
            return Err(ConfigError::Invalid(format!(
                "expected-move lookback must be >= 1, got {zero}"
            )));
        }
        if let Some(year) = self.stats.year {
            if !(1900..=2200).contains(&year) {
                return Err(ConfigError::Invalid(format!("implausible year filter {year}")));
            }
        }
        Ok(())
    }

    /// Every configured level method, sorted and deduplicated.
    pub fn methods(&self) -> Vec<LevelMethod> {
        let mut methods: Vec<LevelMethod> = self
            .levels
            .range_windows
            .iter()
            .map(|&window| LevelMethod::Range { window })
            .chain(
                self.levels
                    .expected_move_lookbacks
                    .iter()
                    .map(|&lookback| LevelMethod::ExpectedMove { lookback }),
            )
            .collect();
        methods.sort();
        methods.dedup();
        methods
    }
}
