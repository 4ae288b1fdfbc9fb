//! Analysis runner: wires loading, level tables, statistics and summaries.
//!
//! Two entry points:
//! - `run_single_analysis()`: loads data per `LoadOptions`, then runs. Used by the CLI.
//! - `run_analysis()`: takes pre-loaded data, no I/O. Used by tests and benches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pivotlab_core::data::QualityReport;
use pivotlab_core::stats::ExpectedMoveSummary;
use pivotlab_core::{LevelMethod, LevelTable, MethodStatistics, RecordFilter};

use crate::config::{AnalysisConfig, ConfigError};
use crate::data_loader::{load_bars, LoadError, LoadOptions, LoadedData};
use crate::observer::AnalysisObserver;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything an analysis run reports, minus the per-bar table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub bar_count: usize,
    pub start_date: String,
    pub end_date: String,
    pub methods: Vec<LevelMethod>,
    pub skew: bool,
    /// Statistics per (method, scope); full history first, then years ascending.
    pub statistics: Vec<MethodStatistics>,
    pub expected_move: Vec<ExpectedMoveSummary>,
    pub quality: QualityReport,
    pub warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl AnalysisResult {
    /// Statistics of `method` over `year` (`None` = full history).
    pub fn statistics_for(&self, method: LevelMethod, year: Option<i32>) -> Option<&MethodStatistics> {
        self.statistics
            .iter()
            .find(|s| s.method == method && s.year == year)
    }
}

/// A finished run: the serializable result and the per-bar level table.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub table: LevelTable,
}

/// Load data per `opts`, then analyse it.
pub fn run_single_analysis(
    config: &AnalysisConfig,
    opts: &LoadOptions,
    observer: &dyn AnalysisObserver,
) -> Result<Analysis, AnalysisError> {
    config.validate_levels()?;
    let loaded = load_bars(opts)?;
    observer.on_data_loaded(&loaded);
    run_analysis(&loaded, config, observer)
}

/// Analyse pre-loaded data. No I/O.
pub fn run_analysis(
    data: &LoadedData,
    config: &AnalysisConfig,
    observer: &dyn AnalysisObserver,
) -> Result<Analysis, AnalysisError> {
    config.validate_levels()?;

    let methods = config.methods();
    let table = LevelTable::build(data.series.clone(), &methods, config.levels.skew);
    for run in table.runs() {
        observer.on_method_complete(run.method, run.levels.defined(), run.levels.len());
    }

    let years = data.series.years();
    let mut warnings = Vec::new();
    let mut scopes: Vec<Option<i32>> = vec![None];
    if let Some(year) = config.stats.year {
        if !years.contains(&year) {
            warnings.push(format!("no bars in {year}; its statistics are empty"));
        }
        scopes.push(Some(year));
    }
    if config.stats.per_year {
        scopes.extend(years.iter().copied().map(Some));
    }
    scopes.sort();
    scopes.dedup();

    let mut statistics = Vec::with_capacity(methods.len() * scopes.len());
    for &method in &methods {
        for &year in &scopes {
            let filter = match year {
                Some(y) => RecordFilter::year(y),
                None => RecordFilter::all(),
            };
            if let Some(stats) = table.statistics(method, filter) {
                observer.on_statistics(&stats);
                statistics.push(stats);
            }
        }
    }

    let expected_move = table.expected_move_summaries();
    for summary in expected_move.iter().filter(|s| s.has_warnings()) {
        observer.on_expected_move_warning(summary);
        warnings.push(format!(
            "EM{}: {} inverted days, {} off-tick days",
            summary.lookback, summary.inverted_days, summary.off_tick_days
        ));
    }
    if let Some(rejected) = data.quality.rejected_rows.filter(|r| *r > 0) {
        warnings.push(format!("{rejected} input rows failed market-logic validation"));
    }

    observer.on_complete(methods.len(), scopes.len());

    let result = AnalysisResult {
        schema_version: SCHEMA_VERSION,
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        bar_count: data.series.len(),
        start_date: data.series.first_date().to_string(),
        end_date: data.series.last_date().to_string(),
        methods,
        skew: config.levels.skew,
        statistics,
        expected_move,
        quality: data.quality.clone(),
        warnings,
    };
    Ok(Analysis { result, table })
}
