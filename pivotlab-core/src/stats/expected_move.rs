//! Descriptive summary of an expected-move level series.

use crate::levels::rounding::is_on_tick;
use crate::levels::{ExpectedMoveLevels, EM_MULTIPLIER};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedMoveSummary {
    pub lookback: usize,
    pub multiplier: f64,
    pub days_defined: usize,
    pub mean_bullish_avg: Option<f64>,
    pub mean_bearish_avg: Option<f64>,
    pub mean_emh: Option<f64>,
    pub mean_eml: Option<f64>,
    pub mean_range: Option<f64>,
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
    /// Mean of `range / open * 100`.
    pub mean_range_pct_of_open: Option<f64>,
    /// Days where EMH <= EML. Any nonzero value indicates bad input.
    pub inverted_days: usize,
    /// Days whose EMH or EML (when positive) is off the tick grid.
    pub off_tick_days: usize,
}

impl ExpectedMoveSummary {
    pub fn compute(lookback: usize, levels: &[Option<ExpectedMoveLevels>]) -> Self {
        let defined: Vec<&ExpectedMoveLevels> = levels.iter().flatten().collect();
        let n = defined.len();
        let mean_of = |f: fn(&ExpectedMoveLevels) -> f64| {
            (n > 0).then(|| defined.iter().map(|l| f(l)).sum::<f64>() / n as f64)
        };
        let ranges = defined.iter().map(|l| l.range);

        Self {
            lookback,
            multiplier: EM_MULTIPLIER,
            days_defined: n,
            mean_bullish_avg: mean_of(|l| l.bullish_avg),
            mean_bearish_avg: mean_of(|l| l.bearish_avg),
            mean_emh: mean_of(|l| l.emh),
            mean_eml: mean_of(|l| l.eml),
            mean_range: mean_of(|l| l.range),
            min_range: ranges.clone().reduce(f64::min),
            max_range: ranges.reduce(f64::max),
            mean_range_pct_of_open: mean_of(|l| l.range / l.open * 100.0),
            inverted_days: defined.iter().filter(|l| l.emh <= l.eml).count(),
            off_tick_days: defined
                .iter()
                .filter(|l| {
                    (l.emh > 0.0 && !is_on_tick(l.emh)) || (l.eml > 0.0 && !is_on_tick(l.eml))
                })
                .count(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        self.inverted_days > 0 || self.off_tick_days > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_helpers::bar;

    fn levels() -> Vec<Option<ExpectedMoveLevels>> {
        let window = [
            bar(0, 100.0, 106.0, 98.0, 105.0),
            bar(1, 105.0, 107.0, 103.0, 104.0),
        ];
        vec![
            None,
            ExpectedMoveLevels::from_window(100.0, &window, false),
            ExpectedMoveLevels::from_window(200.0, &window, false),
        ]
    }

    #[test]
    fn summarises_defined_days_only() {
        let s = ExpectedMoveSummary::compute(2, &levels());
        assert_eq!(s.days_defined, 2);
        assert_eq!(s.multiplier, EM_MULTIPLIER);
        assert_eq!(s.mean_bullish_avg, Some(8.0));
        assert_eq!(s.inverted_days, 0);
        assert_eq!(s.off_tick_days, 0);
        assert!(!s.has_warnings());
        assert!(s.min_range.unwrap() <= s.max_range.unwrap());
    }

    #[test]
    fn empty_series_has_undefined_means() {
        let s = ExpectedMoveSummary::compute(21, &[None, None]);
        assert_eq!(s.days_defined, 0);
        assert!(s.mean_emh.is_none());
        assert!(s.min_range.is_none());
    }
}
