//! Expected-move levels: a band around the day's open sized by the average
//! range of recent up days (upside) and down days (downside).
//!
//! For bar `i` with lookback `L`, the `L` bars before `i` are split into up
//! bars (close > open) and down bars (close <= open):
//!
//! - `EMH_raw = open[i] + mean(high - low | up) * 0.682`
//! - `EML_raw = open[i] - mean(high - low | down) * 0.682`
//!
//! An empty side contributes an average of 0.0. Both pivots are rounded up to
//! the next tick. A raw pivot at or below zero leaves the day without levels.

use super::rounding::ceil_to_tick;
use super::skew::SkewLevels;
use super::{LevelEngine, LevelMethod, PivotBand};
use crate::domain::{Bar, BarSeries};
use serde::{Deserialize, Serialize};

/// Fraction of the average side range projected from the open.
pub const EM_MULTIPLIER: f64 = 0.682;

/// Default lookback in trading days.
pub const DEFAULT_LOOKBACK: usize = 21;

/// Expected-move level set for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedMoveLevels {
    pub open: f64,
    pub bullish_days: u32,
    pub bearish_days: u32,
    pub bullish_avg: f64,
    pub bearish_avg: f64,
    pub emh_raw: f64,
    pub eml_raw: f64,
    pub emh: f64,
    pub eml: f64,
    pub range: f64,
    /// `None` when the band is empty or inverted, or skew levels were not requested.
    pub skew: Option<SkewLevels>,
}

impl ExpectedMoveLevels {
    pub const FIELD_NAMES: [&'static str; 8] = [
        "bullish_avg",
        "bearish_avg",
        "emh_raw",
        "eml_raw",
        "emh",
        "eml",
        "range",
        "nr2",
    ];

    pub const COUNT_NAMES: [&'static str; 2] = ["bullish_days", "bearish_days"];

    /// Build the band for a day opening at `open` from the preceding `window`.
    ///
    /// Returns `None` when either raw pivot is not strictly positive.
    pub fn from_window(open: f64, window: &[Bar], with_skew: bool) -> Option<Self> {
        let (mut up_count, mut up_sum) = (0u32, 0.0);
        let (mut down_count, mut down_sum) = (0u32, 0.0);
        for bar in window {
            if bar.is_up() {
                up_count += 1;
                up_sum += bar.range();
            } else {
                down_count += 1;
                down_sum += bar.range();
            }
        }
        let bullish_avg = if up_count > 0 {
            up_sum / f64::from(up_count)
        } else {
            0.0
        };
        let bearish_avg = if down_count > 0 {
            down_sum / f64::from(down_count)
        } else {
            0.0
        };

        let emh_raw = open + bullish_avg * EM_MULTIPLIER;
        let eml_raw = open - bearish_avg * EM_MULTIPLIER;
        if emh_raw.is_nan() || eml_raw.is_nan() || emh_raw <= 0.0 || eml_raw <= 0.0 {
            return None;
        }
        let emh = ceil_to_tick(emh_raw);
        let eml = ceil_to_tick(eml_raw);

        Some(Self {
            open,
            bullish_days: up_count,
            bearish_days: down_count,
            bullish_avg,
            bearish_avg,
            emh_raw,
            eml_raw,
            emh,
            eml,
            range: emh - eml,
            skew: if with_skew {
                SkewLevels::compute(emh, eml, open)
            } else {
                None
            },
        })
    }

    pub fn values(&self) -> [f64; 8] {
        [
            self.bullish_avg,
            self.bearish_avg,
            self.emh_raw,
            self.eml_raw,
            self.emh,
            self.eml,
            self.range,
            self.open,
        ]
    }

    pub fn counts(&self) -> [u32; 2] {
        [self.bullish_days, self.bearish_days]
    }
}

impl PivotBand for ExpectedMoveLevels {
    fn upper(&self) -> f64 {
        self.emh
    }

    fn lower(&self) -> f64 {
        self.eml
    }

    fn midpoint(&self) -> f64 {
        self.open
    }

    fn range(&self) -> f64 {
        self.range
    }
}

/// Engine computing [`ExpectedMoveLevels`] over a rolling lookback.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedMove {
    lookback: usize,
    with_skew: bool,
}

impl ExpectedMove {
    pub fn new(lookback: usize) -> Self {
        assert!(lookback >= 1, "expected-move lookback must be >= 1");
        Self {
            lookback,
            with_skew: true,
        }
    }

    /// Toggle computation of the skew level set.
    pub fn with_skew(mut self, with_skew: bool) -> Self {
        self.with_skew = with_skew;
        self
    }
}

impl Default for ExpectedMove {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl LevelEngine for ExpectedMove {
    type Levels = ExpectedMoveLevels;

    fn method(&self) -> LevelMethod {
        LevelMethod::ExpectedMove {
            lookback: self.lookback,
        }
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn compute(&self, series: &BarSeries) -> Vec<Option<ExpectedMoveLevels>> {
        series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let window = series.window_before(i, self.lookback)?;
                ExpectedMoveLevels::from_window(bar.open, window, self.with_skew)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_helpers::{assert_approx, bar};
    use crate::domain::DEFAULT_EPSILON;

    #[test]
    fn bullish_average_projects_from_open() {
        // two up bars with range 8, one down bar with range 4
        let window = [
            bar(0, 100.0, 106.0, 98.0, 105.0),
            bar(1, 105.0, 110.0, 102.0, 108.0),
            bar(2, 108.0, 109.0, 105.0, 106.0),
        ];
        let em = ExpectedMoveLevels::from_window(15_000.0, &window, false).unwrap();
        assert_eq!(em.bullish_days, 2);
        assert_eq!(em.bearish_days, 1);
        assert_approx(em.bullish_avg, 8.0, DEFAULT_EPSILON);
        assert_approx(em.bearish_avg, 4.0, DEFAULT_EPSILON);
        assert_approx(em.emh_raw, 15_005.456, 1e-6);
        assert_eq!(em.emh, 15_005.5);
        // 15000 - 2.728 = 14997.272 -> 14997.5
        assert_eq!(em.eml, 14_997.5);
        assert_approx(em.range, 8.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_bar_counts_as_bearish() {
        let window = [bar(0, 100.0, 101.0, 99.0, 100.0)];
        let em = ExpectedMoveLevels::from_window(100.0, &window, false).unwrap();
        assert_eq!(em.bullish_days, 0);
        assert_eq!(em.bearish_days, 1);
        assert_eq!(em.bullish_avg, 0.0);
        assert_eq!(em.emh, 100.0);
    }

    #[test]
    fn one_sided_window_yields_zero_average_not_undefined() {
        let window = [
            bar(0, 100.0, 104.0, 99.0, 103.0),
            bar(1, 103.0, 106.0, 102.0, 105.0),
        ];
        let em = ExpectedMoveLevels::from_window(105.0, &window, true).unwrap();
        assert_eq!(em.bearish_days, 0);
        assert_eq!(em.bearish_avg, 0.0);
        assert_eq!(em.eml, 105.0);
        // open sits on the lower pivot: band is entirely above
        let skew = em.skew.unwrap();
        assert_approx(skew.pct_above, 100.0, DEFAULT_EPSILON);
        assert_approx(skew.differential, 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn levels_undefined_until_lookback_satisfied() {
        let bars: Vec<Bar> = (0..6)
            .map(|d| {
                let o = 100.0 + d as f64;
                bar(d, o, o + 2.0, o - 1.0, o + 1.0)
            })
            .collect();
        let series = BarSeries::new(bars).unwrap();
        let levels = ExpectedMove::new(4).compute(&series);
        assert_eq!(levels.len(), 6);
        assert!(levels[..4].iter().all(Option::is_none));
        assert!(levels[4..].iter().all(Option::is_some));
        let em = levels[4].unwrap();
        assert_eq!(em.open, 104.0);
        assert_approx(em.bullish_avg, 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn skew_toggle() {
        let window = [
            bar(0, 100.0, 104.0, 99.0, 103.0),
            bar(1, 103.0, 104.0, 100.0, 101.0),
        ];
        assert!(ExpectedMoveLevels::from_window(101.0, &window, false)
            .unwrap()
            .skew
            .is_none());
        assert!(ExpectedMoveLevels::from_window(101.0, &window, true)
            .unwrap()
            .skew
            .is_some());
    }

    #[test]
    fn non_positive_raw_pivot_leaves_day_undefined() {
        // down bar with range 90: 50 - 90 * 0.682 = -11.38
        let window = [bar(0, 95.0, 100.0, 10.0, 20.0)];
        assert!(ExpectedMoveLevels::from_window(50.0, &window, true).is_none());

        let bars = vec![
            bar(0, 95.0, 100.0, 10.0, 20.0),
            bar(1, 50.0, 60.0, 40.0, 55.0),
        ];
        let series = BarSeries::new(bars).unwrap();
        let levels = ExpectedMove::new(1).compute(&series);
        assert!(levels[0].is_none());
        assert!(levels[1].is_none());
        let records = crate::classify::classify_series(series.bars(), &levels);
        assert!(records.iter().all(Option::is_none));
    }

    #[test]
    fn method_identity() {
        assert_eq!(ExpectedMove::default().method().label(), "EM21");
        assert_eq!(ExpectedMove::new(9).lookback(), 9);
    }
}
