//! Stage callbacks for an analysis run.
//!
//! The runner never logs directly; it reports to an [`AnalysisObserver`].
//! The CLI passes [`TracingObserver`], tests usually pass [`NullObserver`].

use pivotlab_core::stats::ExpectedMoveSummary;
use pivotlab_core::{LevelMethod, MethodStatistics};

use crate::data_loader::LoadedData;

/// Receives progress and warnings from `run_analysis`.
pub trait AnalysisObserver: Send {
    /// Input bars are loaded and consolidated.
    fn on_data_loaded(&self, data: &LoadedData);

    /// One method's level sets and records are built.
    fn on_method_complete(&self, method: LevelMethod, defined: usize, total: usize);

    /// Statistics for one (method, year) scope are ready.
    fn on_statistics(&self, stats: &MethodStatistics);

    /// An expected-move series looks suspicious (inverted or off-tick bands).
    fn on_expected_move_warning(&self, summary: &ExpectedMoveSummary);

    /// Every stage finished.
    fn on_complete(&self, methods: usize, scopes: usize);
}

/// Reports every stage through `tracing`.
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_data_loaded(&self, data: &LoadedData) {
        let series = &data.series;
        let hash = data.dataset_hash.get(..12).unwrap_or(&data.dataset_hash);
        tracing::info!(
            bars = series.len(),
            first = %series.first_date(),
            last = %series.last_date(),
            synthetic = data.has_synthetic,
            hash,
            "data loaded"
        );
        if let Some(rejected) = data.quality.rejected_rows.filter(|r| *r > 0) {
            tracing::warn!(rejected, "rows failed market-logic validation");
        }
    }

    fn on_method_complete(&self, method: LevelMethod, defined: usize, total: usize) {
        tracing::debug!(%method, defined, total, "levels built");
    }

    fn on_statistics(&self, stats: &MethodStatistics) {
        let t = &stats.tally;
        tracing::debug!(
            method = %stats.method,
            scope = %stats.scope_label(),
            days = t.total,
            touched_both = t.touches_both,
            "statistics ready"
        );
    }

    fn on_expected_move_warning(&self, summary: &ExpectedMoveSummary) {
        tracing::warn!(
            lookback = summary.lookback,
            inverted = summary.inverted_days,
            off_tick = summary.off_tick_days,
            "expected-move bands look malformed"
        );
    }

    fn on_complete(&self, methods: usize, scopes: usize) {
        tracing::info!(methods, scopes, "analysis complete");
    }
}

/// Discards every callback.
pub struct NullObserver;

impl AnalysisObserver for NullObserver {
    fn on_data_loaded(&self, _data: &LoadedData) {}
    fn on_method_complete(&self, _method: LevelMethod, _defined: usize, _total: usize) {}
    fn on_statistics(&self, _stats: &MethodStatistics) {}
    fn on_expected_move_warning(&self, _summary: &ExpectedMoveSummary) {}
    fn on_complete(&self, _methods: usize, _scopes: usize) {}
}
