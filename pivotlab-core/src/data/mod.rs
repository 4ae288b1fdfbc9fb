//! Data ingestion: file readers, consolidation, and quality reporting.

pub mod consolidate;
pub mod ingest;
pub mod provider;
pub mod quality;

pub use consolidate::{consolidate, Consolidated};
pub use ingest::{collect_input_files, read_all, read_bars};
pub use provider::{DataError, DataFormat, RawBar};
pub use quality::{QualityReport, ReturnOutlier, ReturnStats};

use std::path::PathBuf;

/// Read, consolidate and validate daily bars from files or directories.
pub fn load_series(paths: &[PathBuf], format: DataFormat) -> Result<Consolidated, DataError> {
    let raw = read_all(paths, format)?;
    consolidate(&raw)
}
