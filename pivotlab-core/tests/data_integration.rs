//! Integration tests for file ingestion and consolidation.

use chrono::NaiveDate;
use pivotlab_core::data::{load_series, DataError, DataFormat, QualityReport};
use std::fs;
use std::path::PathBuf;

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn ninjatrader_directory_consolidates_across_contract_files() {
    let dir = tempfile::tempdir().unwrap();
    // contract files overlap on 2024-03-14; the first file (by name) wins
    write(
        &dir,
        "NQ 03-24.Last.txt",
        "20240312;18000;18100;17950;18050;400000\n\
         20240313;18050;18150;18000;18100;410000\n\
         20240314;18100;18200;18050;18150;420000\n",
    );
    write(
        &dir,
        "NQ 06-24.Last.txt",
        "20240314;18300;18400;18250;18350;90000\n\
         20240315;18350;18450;18300;18400;95000\n",
    );
    write(&dir, "notes.md", "ignored");

    let out = load_series(&[dir.path().to_path_buf()], DataFormat::Auto).unwrap();
    assert_eq!(out.input_rows, 5);
    assert_eq!(out.duplicates_dropped, 1);
    assert!(out.rejected.is_empty());

    let bars = out.series.bars();
    assert_eq!(bars.len(), 4);
    let overlap = bars
        .iter()
        .find(|b| b.date == NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())
        .unwrap();
    assert_eq!(overlap.open, 18100.0);
}

#[test]
fn csv_file_with_invalid_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "nq_daily.csv",
        "Date,Open,High,Low,Close,Volume\n\
         2024-01-03,100,105,99,104,1200\n\
         2024-01-02,98,101,97,100,1000\n\
         2024-01-04,104,103,101,102,900\n\
         2024-01-05,102,106,101,105,0\n",
    );

    let out = load_series(&[path], DataFormat::Csv).unwrap();
    assert_eq!(out.series.len(), 2);
    assert_eq!(out.rejected.len(), 2);
    assert_eq!(
        out.series.first_date(),
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    );

    let report = QualityReport::from_consolidated(&out);
    assert_eq!(report.rejected_rows, Some(2));
    assert_eq!(report.input_rows, Some(4));
    assert_eq!(report.bars, 2);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_series(&[dir.path().join("absent.csv")], DataFormat::Csv).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));
}

#[test]
fn empty_directory_is_no_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_series(&[dir.path().to_path_buf()], DataFormat::Auto).unwrap_err();
    assert!(matches!(err, DataError::NoInput));
}
