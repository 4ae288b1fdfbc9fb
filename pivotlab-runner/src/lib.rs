//! PivotLab Runner: analysis orchestration on top of `pivotlab-core`.
//!
//! This crate provides:
//! - TOML configuration with defaults and validation
//! - Data loading from bar files, or a seeded synthetic series
//! - The analysis runner (level tables, per-scope statistics, EM summaries)
//! - Stage observers for logging
//! - JSON, CSV, Parquet and Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod observer;
pub mod runner;

pub use config::{AnalysisConfig, ConfigError};
pub use data_loader::{load_bars, DataSource, LoadError, LoadOptions, LoadedData};
pub use export::{default_run_label, generate_report, save_artifacts};
pub use observer::{AnalysisObserver, NullObserver, TracingObserver};
pub use runner::{
    run_analysis, run_single_analysis, Analysis, AnalysisError, AnalysisResult, SCHEMA_VERSION,
};
