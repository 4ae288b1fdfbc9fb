//! PivotLab Core: daily bars, level engines, touch classification, statistics.
//!
//! This crate holds the deterministic analysis pipeline:
//! - Domain types (bars, ordered bar series)
//! - Range-based ("DN") and expected-move/skew level engines
//! - Touch/close classification of each bar against its level set
//! - Mergeable tallies and report tables over classified records
//! - File ingestion and consolidation into a clean series
//!
//! Data flows one way: series → level sets → records → statistics. Each stage
//! builds a new vector from the previous one; nothing is mutated in place.

pub mod classify;
pub mod data;
pub mod domain;
pub mod levels;
pub mod stats;
pub mod table;

pub use classify::{classify, classify_series, BothTouchedClose, TouchRecord};
pub use domain::{Bar, BarSeries, SeriesError};
pub use levels::{LevelEngine, LevelMethod, PivotBand, RangeWindow};
pub use stats::{MethodStatistics, RecordFilter, TouchTally};
pub use table::{LevelTable, MethodLevels, MethodRun};
