//! Level engines: price bands derived from preceding daily bars.
//!
//! Two methods are implemented:
//! - [`RangeLevels`] ("DN"): pivots from the prior 1 or 3 days' high/low range.
//! - [`ExpectedMoveLevels`]: pivots from rolling up/down-day range averages
//!   anchored at the day's open, with an optional skew-adjusted zone set.
//!
//! Engines are pure: bar series in, one `Option<Levels>` per bar out. The
//! level set at bar `i` is built only from bars strictly before `i` (plus the
//! open of bar `i` for the expected-move method). Bars without enough history
//! get `None`, never a zero-filled level set.

pub mod expected_move;
pub mod range;
pub mod rounding;
pub mod skew;

pub use expected_move::{ExpectedMove, ExpectedMoveLevels, EM_MULTIPLIER};
pub use range::{RangeEngine, RangeLevels, RangeWindow, STD_FRACTIONS};
pub use skew::SkewLevels;

use crate::domain::BarSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The pivot pair every level set exposes to the classifier.
pub trait PivotBand {
    /// Upper pivot (Q1).
    fn upper(&self) -> f64;

    /// Lower pivot (Q4).
    fn lower(&self) -> f64;

    /// Midpoint reference (NR2).
    fn midpoint(&self) -> f64;

    fn range(&self) -> f64 {
        self.upper() - self.lower()
    }
}

/// Trait for level engines.
///
/// # Look-ahead guard
/// No level set at bar t may depend on the high, low or close of bar t or
/// any later bar. Every engine must pass the truncated-vs-full series test.
pub trait LevelEngine: Send + Sync {
    type Levels: PivotBand + Clone;

    /// Stable identity of the method this engine computes.
    fn method(&self) -> LevelMethod;

    /// Number of preceding bars required; bars `0..lookback()` get `None`.
    fn lookback(&self) -> usize;

    /// Compute one level set per bar, same length as the series.
    fn compute(&self, series: &BarSeries) -> Vec<Option<Self::Levels>>;
}

/// A level derivation method together with its window parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelMethod {
    Range { window: RangeWindow },
    ExpectedMove { lookback: usize },
}

impl LevelMethod {
    /// Short display label: `1D`, `3D`, `EM21`.
    pub fn label(&self) -> String {
        match self {
            LevelMethod::Range { window } => format!("{}D", window.bars()),
            LevelMethod::ExpectedMove { lookback } => format!("EM{lookback}"),
        }
    }

    /// Column prefix used in the wide output table: `d1`, `d3`, `em21`.
    pub fn column_prefix(&self) -> String {
        match self {
            LevelMethod::Range { window } => format!("d{}", window.bars()),
            LevelMethod::ExpectedMove { lookback } => format!("em{lookback}"),
        }
    }
}

impl fmt::Display for LevelMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_labels() {
        let one = LevelMethod::Range {
            window: RangeWindow::OneDay,
        };
        let em = LevelMethod::ExpectedMove { lookback: 21 };
        assert_eq!(one.label(), "1D");
        assert_eq!(one.column_prefix(), "d1");
        assert_eq!(em.to_string(), "EM21");
        assert_eq!(em.column_prefix(), "em21");
    }

    #[test]
    fn method_json_shape() {
        let three = LevelMethod::Range {
            window: RangeWindow::ThreeDay,
        };
        let json = serde_json::to_string(&three).unwrap();
        assert_eq!(json, r#"{"kind":"range","window":3}"#);
        let back: LevelMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, three);
    }

    #[test]
    fn methods_order_range_before_expected_move() {
        let mut methods = vec![
            LevelMethod::ExpectedMove { lookback: 9 },
            LevelMethod::Range {
                window: RangeWindow::ThreeDay,
            },
            LevelMethod::Range {
                window: RangeWindow::OneDay,
            },
        ];
        methods.sort();
        assert_eq!(methods[0].label(), "1D");
        assert_eq!(methods[2].label(), "EM9");
    }
}
