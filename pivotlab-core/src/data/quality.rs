//! Descriptive data-quality report for a consolidated bar series.

use super::consolidate::Consolidated;
use crate::domain::{Bar, BarSeries};
use crate::levels::rounding::is_on_tick;
use crate::stats::percentage;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Percentiles reported for daily returns.
pub const RETURN_PERCENTILES: [u8; 9] = [1, 5, 10, 25, 50, 75, 90, 95, 99];

/// Returns whose absolute z-score exceeds this are flagged as outliers.
pub const OUTLIER_Z: f64 = 4.0;

/// A daily return far from the series mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnOutlier {
    pub date: NaiveDate,
    pub close: f64,
    /// Close-to-close return in percent.
    pub ret: f64,
    /// Absolute z-score against the population standard deviation.
    pub z: f64,
}

/// Distribution of close-to-close daily returns, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// `(percentile, value)` pairs for [`RETURN_PERCENTILES`].
    pub percentiles: Vec<(u8, f64)>,
    pub outliers: Vec<ReturnOutlier>,
}

impl ReturnStats {
    /// `None` with fewer than two bars.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let returns: Vec<(NaiveDate, f64, f64)> = bars
            .windows(2)
            .map(|w| (w[1].date, w[1].close, (w[1].close / w[0].close - 1.0) * 100.0))
            .collect();
        if returns.is_empty() {
            return None;
        }

        let n = returns.len() as f64;
        let mean = returns.iter().map(|r| r.2).sum::<f64>() / n;
        let sq_dev = returns.iter().map(|r| (r.2 - mean).powi(2)).sum::<f64>();
        let std_dev = if returns.len() > 1 {
            (sq_dev / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let population_std = (sq_dev / n).sqrt();

        let outliers = if population_std > 0.0 {
            returns
                .iter()
                .filter_map(|&(date, close, ret)| {
                    let z = ((ret - mean) / population_std).abs();
                    (z > OUTLIER_Z).then_some(ReturnOutlier { date, close, ret, z })
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut sorted: Vec<f64> = returns.iter().map(|r| r.2).collect();
        sorted.sort_by(f64::total_cmp);
        let percentiles = RETURN_PERCENTILES
            .iter()
            .map(|&p| (p, percentile_sorted(&sorted, f64::from(p))))
            .collect();

        Some(Self {
            count: returns.len(),
            mean,
            median: percentile_sorted(&sorted, 50.0),
            std_dev,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            percentiles,
            outliers,
        })
    }
}

/// Percentile of a sorted slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub bars: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub bars_per_year: BTreeMap<i32, usize>,
    pub up_days: usize,
    pub down_days: usize,
    pub up_pct: f64,
    pub mean_range: f64,
    /// OHLC values off the 0.25 tick grid.
    pub off_tick_prices: usize,
    /// Largest calendar gap between consecutive bars.
    pub max_gap_days: i64,
    pub input_rows: Option<usize>,
    pub duplicates_dropped: Option<usize>,
    pub rejected_rows: Option<usize>,
    #[serde(default)]
    pub returns: Option<ReturnStats>,
}

impl QualityReport {
    pub fn from_series(series: &BarSeries) -> Self {
        let bars = series.bars();
        let mut bars_per_year = BTreeMap::new();
        for bar in bars {
            *bars_per_year.entry(bar.date.year()).or_insert(0) += 1;
        }
        let up_days = bars.iter().filter(|b| b.is_up()).count();
        let off_tick_prices = bars
            .iter()
            .flat_map(|b| [b.open, b.high, b.low, b.close])
            .filter(|p| !is_on_tick(*p))
            .count();
        let max_gap_days = bars
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .max()
            .unwrap_or(0);

        Self {
            bars: bars.len(),
            first_date: series.first_date(),
            last_date: series.last_date(),
            bars_per_year,
            up_days,
            down_days: bars.len() - up_days,
            up_pct: percentage(up_days, bars.len()),
            mean_range: bars.iter().map(|b| b.range()).sum::<f64>() / bars.len() as f64,
            off_tick_prices,
            max_gap_days,
            input_rows: None,
            duplicates_dropped: None,
            rejected_rows: None,
            returns: ReturnStats::from_bars(bars),
        }
    }

    pub fn from_consolidated(consolidated: &Consolidated) -> Self {
        Self {
            input_rows: Some(consolidated.input_rows),
            duplicates_dropped: Some(consolidated.duplicates_dropped),
            rejected_rows: Some(consolidated.rejected.len()),
            ..Self::from_series(&consolidated.series)
        }
    }
}
