//! Touch/close classification of a bar against a level set's pivots.
//!
//! Every comparison is independent and the bar is not re-validated: the high
//! is only compared with Q1, the low only with Q4, and the close with both.

use crate::domain::Bar;
use crate::levels::PivotBand;
use serde::{Deserialize, Serialize};

/// Where the close landed on a day that touched both pivots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BothTouchedClose {
    /// close > Q1
    AboveUpper,
    /// close < Q4
    BelowLower,
    /// Q4 <= close <= Q1
    Between,
}

/// Classification of one bar against one level set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchRecord {
    pub touches_upper: bool,
    pub touches_lower: bool,
    pub touches_both: bool,
    pub touches_upper_only: bool,
    pub touches_lower_only: bool,
    pub closes_below_upper: bool,
    pub closes_at_or_above_upper: bool,
    pub closes_above_lower: bool,
    pub closes_at_or_below_lower: bool,
    /// Present only when both pivots were touched.
    pub both_touched_close: Option<BothTouchedClose>,
    /// `high - Q1` when the high exceeds Q1, else 0.
    pub points_above_upper: f64,
    /// `Q4 - low` when the low is under Q4, else 0.
    pub points_below_lower: f64,
    /// `close - Q1` on both-touched days closing above Q1, else 0.
    pub close_points_above_upper: f64,
    /// `Q4 - close` on both-touched days closing below Q4, else 0.
    pub close_points_below_lower: f64,
}

impl TouchRecord {
    pub const FLAG_NAMES: [&'static str; 12] = [
        "touch_q1",
        "touch_q4",
        "touch_both",
        "touch_q1_only",
        "touch_q4_only",
        "close_below_q1",
        "close_at_or_above_q1",
        "close_above_q4",
        "close_at_or_below_q4",
        "both_close_above_q1",
        "both_close_below_q4",
        "both_close_between",
    ];

    pub const MAGNITUDE_NAMES: [&'static str; 4] = [
        "points_above_q1",
        "points_below_q4",
        "close_points_above_q1",
        "close_points_below_q4",
    ];

    /// Classify `bar` against the pivots of `levels`.
    pub fn classify<L: PivotBand + ?Sized>(bar: &Bar, levels: &L) -> Self {
        let (q1, q4) = (levels.upper(), levels.lower());

        let touches_upper = bar.high >= q1;
        let touches_lower = bar.low <= q4;
        let touches_both = touches_upper && touches_lower;

        let both_touched_close = touches_both.then(|| {
            if bar.close > q1 {
                BothTouchedClose::AboveUpper
            } else if bar.close < q4 {
                BothTouchedClose::BelowLower
            } else {
                BothTouchedClose::Between
            }
        });

        let (close_points_above_upper, close_points_below_lower) = match both_touched_close {
            Some(BothTouchedClose::AboveUpper) => (bar.close - q1, 0.0),
            Some(BothTouchedClose::BelowLower) => (0.0, q4 - bar.close),
            _ => (0.0, 0.0),
        };

        Self {
            touches_upper,
            touches_lower,
            touches_both,
            touches_upper_only: touches_upper && !touches_lower,
            touches_lower_only: touches_lower && !touches_upper,
            closes_below_upper: bar.close < q1,
            closes_at_or_above_upper: bar.close >= q1,
            closes_above_lower: bar.close > q4,
            closes_at_or_below_lower: bar.close <= q4,
            both_touched_close,
            points_above_upper: if bar.high > q1 { bar.high - q1 } else { 0.0 },
            points_below_lower: if bar.low < q4 { q4 - bar.low } else { 0.0 },
            close_points_above_upper,
            close_points_below_lower,
        }
    }

    pub fn flags(&self) -> [bool; 12] {
        let outcome = self.both_touched_close;
        [
            self.touches_upper,
            self.touches_lower,
            self.touches_both,
            self.touches_upper_only,
            self.touches_lower_only,
            self.closes_below_upper,
            self.closes_at_or_above_upper,
            self.closes_above_lower,
            self.closes_at_or_below_lower,
            outcome == Some(BothTouchedClose::AboveUpper),
            outcome == Some(BothTouchedClose::BelowLower),
            outcome == Some(BothTouchedClose::Between),
        ]
    }

    pub fn magnitudes(&self) -> [f64; 4] {
        [
            self.points_above_upper,
            self.points_below_lower,
            self.close_points_above_upper,
            self.close_points_below_lower,
        ]
    }
}

/// Classify a bar against an optional level set.
///
/// An undefined level set yields an undefined record.
pub fn classify<L: PivotBand>(bar: &Bar, levels: Option<&L>) -> Option<TouchRecord> {
    levels.map(|l| TouchRecord::classify(bar, l))
}

/// Classify every bar against its level set, index by index.
pub fn classify_series<L: PivotBand>(bars: &[Bar], levels: &[Option<L>]) -> Vec<Option<TouchRecord>> {
    debug_assert_eq!(bars.len(), levels.len());
    bars.iter()
        .zip(levels)
        .map(|(bar, l)| classify(bar, l.as_ref()))
        .collect()
}
