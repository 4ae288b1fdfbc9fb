//! Raw input rows, input formats, and structured data errors.

use crate::domain::{Bar, SeriesError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One parsed input row, before consolidation and validation.
///
/// Volume is signed so that malformed negative values survive parsing and
/// are rejected by validation rather than by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl RawBar {
    /// Convert to a [`Bar`]. Negative volume clamps to zero.
    pub fn to_bar(&self) -> Bar {
        Bar {
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: u64::try_from(self.volume).unwrap_or(0),
        }
    }
}

/// Layout of a daily input file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Pick by extension: `.txt` is NinjaTrader, anything else CSV.
    #[default]
    Auto,
    /// Headered `Date,Open,High,Low,Close,Volume`.
    Csv,
    /// Headerless `YYYYMMDD;Open;High;Low;Close;Volume`.
    NinjaTrader,
}

impl DataFormat {
    /// Resolve [`DataFormat::Auto`] for a concrete file.
    pub fn resolve(self, path: &Path) -> DataFormat {
        match self {
            DataFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("txt") => DataFormat::NinjaTrader,
                _ => DataFormat::Csv,
            },
            other => other,
        }
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("no input files found")]
    NoInput,

    #[error("no valid bars after consolidation ({rejected} rows rejected)")]
    NoValidBars { rejected: usize },

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Series(#[from] SeriesError),
}
