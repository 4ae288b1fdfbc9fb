//! Range-based ("DN") levels from the prior 1 or 3 days' high/low.
//!
//! One-day window: Q1 = prior high, Q4 = prior low, NR2 = Q1 - range/2.
//! Three-day window: the window high/low span the three prior bars,
//! NR2 = window low + range/2, then Q1 = NR2 + range/2 and Q4 = NR2 - range/2.
//!
//! Sub-levels are fixed fractions of the range. No rounding is applied.

use super::{LevelEngine, LevelMethod, PivotBand};
use crate::domain::BarSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Band fractions for the standard-deviation levels, nearest first.
pub const STD_FRACTIONS: [f64; 5] = [0.125, 0.159, 0.25, 0.341, 0.375];

const INNER_ZONE: f64 = 0.125;
const OUTER_ZONE: f64 = 0.159;

/// Lookback window of the range method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum RangeWindow {
    OneDay,
    ThreeDay,
}

impl RangeWindow {
    pub fn bars(self) -> usize {
        match self {
            RangeWindow::OneDay => 1,
            RangeWindow::ThreeDay => 3,
        }
    }
}

impl TryFrom<usize> for RangeWindow {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RangeWindow::OneDay),
            3 => Ok(RangeWindow::ThreeDay),
            other => Err(format!("range window must be 1 or 3, got {other}")),
        }
    }
}

impl From<RangeWindow> for usize {
    fn from(window: RangeWindow) -> Self {
        window.bars()
    }
}

impl fmt::Display for RangeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.bars())
    }
}

/// Level set of the range method for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeLevels {
    pub window_high: f64,
    pub window_low: f64,
    pub q1: f64,
    pub q4: f64,
    pub range: f64,
    pub half_range: f64,
    pub nr2: f64,
    pub z2h: f64,
    pub z2l: f64,
    pub z3h: f64,
    pub z3l: f64,
    pub tch: f64,
    pub tcl: f64,
    pub tvh: f64,
    pub tvl: f64,
    /// `Q1 + STD_FRACTIONS[k] * range`.
    pub std_above: [f64; 5],
    /// `Q4 - STD_FRACTIONS[k] * range`.
    pub std_below: [f64; 5],
    pub extension_up: f64,
    pub extension_down: f64,
}

impl RangeLevels {
    /// Column names, in the order of [`RangeLevels::values`].
    pub const FIELD_NAMES: [&'static str; 27] = [
        "window_high",
        "window_low",
        "q1",
        "q4",
        "range",
        "half_range",
        "nr2",
        "z2h",
        "z2l",
        "z3h",
        "z3l",
        "tch",
        "tcl",
        "tvh",
        "tvl",
        "std1",
        "std2",
        "std3",
        "std4",
        "std5",
        "std1_neg",
        "std2_neg",
        "std3_neg",
        "std4_neg",
        "std5_neg",
        "ext_up",
        "ext_down",
    ];

    /// Derive the level set from a window's extremes.
    pub fn from_window(window: RangeWindow, window_high: f64, window_low: f64) -> Self {
        let range = window_high - window_low;
        let half_range = range / 2.0;
        let (q1, q4, nr2) = match window {
            RangeWindow::OneDay => (window_high, window_low, window_high - half_range),
            RangeWindow::ThreeDay => {
                let nr2 = window_low + half_range;
                (nr2 + half_range, nr2 - half_range, nr2)
            }
        };

        Self {
            window_high,
            window_low,
            q1,
            q4,
            range,
            half_range,
            nr2,
            z2h: nr2 + OUTER_ZONE * range,
            z2l: nr2 + INNER_ZONE * range,
            z3h: nr2 - INNER_ZONE * range,
            z3l: nr2 - OUTER_ZONE * range,
            tch: q1 - INNER_ZONE * range,
            tcl: q1 - OUTER_ZONE * range,
            tvh: q4 + OUTER_ZONE * range,
            tvl: q4 + INNER_ZONE * range,
            std_above: STD_FRACTIONS.map(|f| q1 + f * range),
            std_below: STD_FRACTIONS.map(|f| q4 - f * range),
            extension_up: q1 + half_range,
            extension_down: q4 - half_range,
        }
    }

    pub fn values(&self) -> [f64; 27] {
        let [s1, s2, s3, s4, s5] = self.std_above;
        let [n1, n2, n3, n4, n5] = self.std_below;
        [
            self.window_high,
            self.window_low,
            self.q1,
            self.q4,
            self.range,
            self.half_range,
            self.nr2,
            self.z2h,
            self.z2l,
            self.z3h,
            self.z3l,
            self.tch,
            self.tcl,
            self.tvh,
            self.tvl,
            s1,
            s2,
            s3,
            s4,
            s5,
            n1,
            n2,
            n3,
            n4,
            n5,
            self.extension_up,
            self.extension_down,
        ]
    }
}

impl PivotBand for RangeLevels {
    fn upper(&self) -> f64 {
        self.q1
    }

    fn lower(&self) -> f64 {
        self.q4
    }

    fn midpoint(&self) -> f64 {
        self.nr2
    }

    fn range(&self) -> f64 {
        self.range
    }
}

/// Engine computing [`RangeLevels`] over a fixed window.
#[derive(Debug, Clone, Copy)]
pub struct RangeEngine {
    window: RangeWindow,
}

impl RangeEngine {
    pub fn new(window: RangeWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> RangeWindow {
        self.window
    }
}

impl LevelEngine for RangeEngine {
    type Levels = RangeLevels;

    fn method(&self) -> LevelMethod {
        LevelMethod::Range {
            window: self.window,
        }
    }

    fn lookback(&self) -> usize {
        self.window.bars()
    }

    fn compute(&self, series: &BarSeries) -> Vec<Option<RangeLevels>> {
        let w = self.window.bars();
        (0..series.len())
            .map(|i| {
                let window = series.window_before(i, w)?;
                let high = window
                    .iter()
                    .map(|b| b.high)
                    .fold(f64::NEG_INFINITY, f64::max);
                let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
                if !high.is_finite() || !low.is_finite() {
                    return None;
                }
                Some(RangeLevels::from_window(self.window, high, low))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_helpers::{assert_approx, bar};
    use crate::domain::DEFAULT_EPSILON;

    fn series() -> BarSeries {
        BarSeries::new(vec![
            bar(0, 104.0, 110.0, 100.0, 105.0),
            bar(1, 105.0, 112.0, 103.0, 111.0),
            bar(2, 111.0, 115.0, 108.0, 109.0),
            bar(3, 109.0, 113.0, 106.0, 107.0),
            bar(4, 107.0, 109.0, 101.0, 102.0),
        ])
        .unwrap()
    }

    #[test]
    fn one_day_levels_from_prior_bar() {
        let levels = RangeEngine::new(RangeWindow::OneDay).compute(&series());
        assert!(levels[0].is_none());
        let l = levels[1].unwrap();
        assert_approx(l.q1, 110.0, DEFAULT_EPSILON);
        assert_approx(l.q4, 100.0, DEFAULT_EPSILON);
        assert_approx(l.range, 10.0, DEFAULT_EPSILON);
        assert_approx(l.nr2, 105.0, DEFAULT_EPSILON);
        assert_approx(l.z2h, 106.59, DEFAULT_EPSILON);
        assert_approx(l.z2l, 106.25, DEFAULT_EPSILON);
        assert_approx(l.z3h, 103.75, DEFAULT_EPSILON);
        assert_approx(l.z3l, 103.41, DEFAULT_EPSILON);
    }

    #[test]
    fn one_day_transition_and_band_levels() {
        let l = RangeLevels::from_window(RangeWindow::OneDay, 110.0, 100.0);
        assert_approx(l.tch, 108.75, DEFAULT_EPSILON);
        assert_approx(l.tcl, 108.41, DEFAULT_EPSILON);
        assert_approx(l.tvh, 101.59, DEFAULT_EPSILON);
        assert_approx(l.tvl, 101.25, DEFAULT_EPSILON);
        assert_approx(l.std_above[0], 111.25, DEFAULT_EPSILON);
        assert_approx(l.std_above[4], 113.75, DEFAULT_EPSILON);
        assert_approx(l.std_below[2], 97.5, DEFAULT_EPSILON);
        assert_approx(l.std_below[3], 96.59, DEFAULT_EPSILON);
        assert_approx(l.extension_up, 115.0, DEFAULT_EPSILON);
        assert_approx(l.extension_down, 95.0, DEFAULT_EPSILON);
    }

    #[test]
    fn three_day_levels_span_three_prior_bars() {
        let levels = RangeEngine::new(RangeWindow::ThreeDay).compute(&series());
        assert!(levels[..3].iter().all(Option::is_none));

        // bars 0..3: high 115, low 100
        let l = levels[3].unwrap();
        assert_approx(l.window_high, 115.0, DEFAULT_EPSILON);
        assert_approx(l.window_low, 100.0, DEFAULT_EPSILON);
        assert_approx(l.nr2, 107.5, DEFAULT_EPSILON);
        assert_approx(l.q1, 115.0, DEFAULT_EPSILON);
        assert_approx(l.q4, 100.0, DEFAULT_EPSILON);

        // bars 1..4: high 115, low 103
        let l = levels[4].unwrap();
        assert_approx(l.window_low, 103.0, DEFAULT_EPSILON);
        assert_approx(l.range, 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn current_bar_does_not_affect_its_levels() {
        let mut bars = series().bars().to_vec();
        bars[1].high = 500.0;
        bars[1].close = 499.0;
        let altered = BarSeries::new(bars).unwrap();
        let engine = RangeEngine::new(RangeWindow::OneDay);
        assert_eq!(engine.compute(&altered)[1], engine.compute(&series())[1]);
    }

    #[test]
    fn too_short_series_is_all_undefined() {
        let short = BarSeries::new(series().bars()[..2].to_vec()).unwrap();
        let levels = RangeEngine::new(RangeWindow::ThreeDay).compute(&short);
        assert_eq!(levels.len(), 2);
        assert!(levels.iter().all(Option::is_none));
    }

    #[test]
    fn window_from_usize() {
        assert_eq!(RangeWindow::try_from(1), Ok(RangeWindow::OneDay));
        assert_eq!(RangeWindow::try_from(3), Ok(RangeWindow::ThreeDay));
        assert!(RangeWindow::try_from(2).is_err());
    }

    #[test]
    fn values_align_with_field_names() {
        let l = RangeLevels::from_window(RangeWindow::OneDay, 110.0, 100.0);
        let values = l.values();
        let idx = |name: &str| {
            RangeLevels::FIELD_NAMES
                .iter()
                .position(|n| *n == name)
                .unwrap()
        };
        assert_eq!(values[idx("q1")], l.q1);
        assert_eq!(values[idx("z2h")], l.z2h);
        assert_eq!(values[idx("std5_neg")], l.std_below[4]);
        assert_eq!(values[idx("ext_down")], l.extension_down);
    }
}
