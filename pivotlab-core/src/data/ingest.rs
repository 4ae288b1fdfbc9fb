//! File readers for daily bar files.
//!
//! Two layouts are supported: headered CSV (`Date,Open,High,Low,Close,Volume`)
//! and NinjaTrader daily exports (`YYYYMMDD;Open;High;Low;Close;Volume`,
//! no header). Readers return rows in file order; ordering, de-duplication
//! and validation happen in [`super::consolidate`].

use super::provider::{DataError, DataFormat, RawBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "DATE")]
    date: String,
    #[serde(alias = "Open", alias = "OPEN")]
    open: f64,
    #[serde(alias = "High", alias = "HIGH")]
    high: f64,
    #[serde(alias = "Low", alias = "LOW")]
    low: f64,
    #[serde(alias = "Close", alias = "CLOSE")]
    close: f64,
    #[serde(alias = "Volume", alias = "VOLUME")]
    volume: f64,
}

type NinjaTraderRow = (String, f64, f64, f64, f64, f64);

/// Parse a date in any of the accepted layouts.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Read one file in the given format.
pub fn read_bars(path: &Path, format: DataFormat) -> Result<Vec<RawBar>, DataError> {
    let file = fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = match format.resolve(path) {
        DataFormat::NinjaTrader => read_ninjatrader(file, path)?,
        _ => read_csv(file, path)?,
    };
    info!(file = %path.display(), rows = bars.len(), "loaded daily file");
    Ok(bars)
}

/// Read headered CSV rows from any reader. `path` is used for error reporting.
pub fn read_csv<R: Read>(reader: R, path: &Path) -> Result<Vec<RawBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for result in rdr.deserialize::<CsvRow>() {
        let row = result.map_err(|e| csv_error(path, &e))?;
        let line = bars.len() as u64 + 2;
        bars.push(RawBar {
            date: parse_date(&row.date).ok_or_else(|| DataError::Parse {
                path: path.to_path_buf(),
                line,
                message: format!("unrecognised date '{}'", row.date),
            })?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume as i64,
        });
    }
    Ok(bars)
}

/// Read NinjaTrader daily rows from any reader.
pub fn read_ninjatrader<R: Read>(reader: R, path: &Path) -> Result<Vec<RawBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for result in rdr.deserialize::<NinjaTraderRow>() {
        let (date, open, high, low, close, volume) = result.map_err(|e| csv_error(path, &e))?;
        let line = bars.len() as u64 + 1;
        let date = NaiveDate::parse_from_str(&date, "%Y%m%d").map_err(|e| DataError::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("bad date '{date}': {e}"),
        })?;
        bars.push(RawBar {
            date,
            open,
            high,
            low,
            close,
            volume: volume as i64,
        });
    }
    Ok(bars)
}

fn csv_error(path: &Path, err: &csv::Error) -> DataError {
    DataError::Parse {
        path: path.to_path_buf(),
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

/// Expand inputs into a sorted list of files. Directories contribute their
/// `.txt` and `.csv` entries.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, DataError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|source| DataError::Io {
                path: path.clone(),
                source,
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("txt") | Some("csv")
                    )
                })
                .collect();
            found.sort();
            debug!(dir = %path.display(), files = found.len(), "scanned input directory");
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    if files.is_empty() {
        return Err(DataError::NoInput);
    }
    Ok(files)
}

/// Read every input file, concatenated in file order.
pub fn read_all(paths: &[PathBuf], format: DataFormat) -> Result<Vec<RawBar>, DataError> {
    let mut bars = Vec::new();
    for file in collect_input_files(paths)? {
        bars.extend(read_bars(&file, format)?);
    }
    Ok(bars)
}
