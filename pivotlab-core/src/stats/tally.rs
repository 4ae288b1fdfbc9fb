//! Mergeable counts and magnitude sums over touch records.

use crate::classify::{BothTouchedClose, TouchRecord};
use crate::domain::Bar;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::iter::Sum;

/// Which records enter a tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Keep only bars dated in this calendar year.
    pub year: Option<i32>,
    /// Keep only records where both pivots were touched.
    pub both_touched_only: bool,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    pub fn accepts(&self, bar: &Bar, record: &TouchRecord) -> bool {
        if let Some(year) = self.year {
            if bar.date.year() != year {
                return false;
            }
        }
        !self.both_touched_only || record.touches_both
    }
}

/// Counts and sums over a set of defined touch records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchTally {
    pub total: usize,
    pub touches_upper: usize,
    pub touches_lower: usize,
    pub touches_both: usize,
    pub touches_upper_only: usize,
    pub touches_lower_only: usize,
    pub closes_below_upper: usize,
    pub closes_at_or_above_upper: usize,
    pub closes_above_lower: usize,
    pub closes_at_or_below_lower: usize,
    pub both_close_above_upper: usize,
    pub both_close_below_lower: usize,
    pub both_close_between: usize,
    pub points_above_upper_sum: f64,
    pub points_below_lower_sum: f64,
    pub close_points_above_upper_sum: f64,
    pub close_points_below_lower_sum: f64,
}

impl TouchTally {
    /// Tally of a single record.
    pub fn of(record: &TouchRecord) -> Self {
        let outcome = record.both_touched_close;
        Self {
            total: 1,
            touches_upper: usize::from(record.touches_upper),
            touches_lower: usize::from(record.touches_lower),
            touches_both: usize::from(record.touches_both),
            touches_upper_only: usize::from(record.touches_upper_only),
            touches_lower_only: usize::from(record.touches_lower_only),
            closes_below_upper: usize::from(record.closes_below_upper),
            closes_at_or_above_upper: usize::from(record.closes_at_or_above_upper),
            closes_above_lower: usize::from(record.closes_above_lower),
            closes_at_or_below_lower: usize::from(record.closes_at_or_below_lower),
            both_close_above_upper: usize::from(outcome == Some(BothTouchedClose::AboveUpper)),
            both_close_below_lower: usize::from(outcome == Some(BothTouchedClose::BelowLower)),
            both_close_between: usize::from(outcome == Some(BothTouchedClose::Between)),
            points_above_upper_sum: record.points_above_upper,
            points_below_lower_sum: record.points_below_lower,
            close_points_above_upper_sum: record.close_points_above_upper,
            close_points_below_lower_sum: record.close_points_below_lower,
        }
    }

    pub fn push(&mut self, record: &TouchRecord) {
        *self = self.merge(&Self::of(record));
    }

    /// Combine two partial tallies. Associative and commutative; the default
    /// tally is the identity.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            total: self.total + other.total,
            touches_upper: self.touches_upper + other.touches_upper,
            touches_lower: self.touches_lower + other.touches_lower,
            touches_both: self.touches_both + other.touches_both,
            touches_upper_only: self.touches_upper_only + other.touches_upper_only,
            touches_lower_only: self.touches_lower_only + other.touches_lower_only,
            closes_below_upper: self.closes_below_upper + other.closes_below_upper,
            closes_at_or_above_upper: self.closes_at_or_above_upper
                + other.closes_at_or_above_upper,
            closes_above_lower: self.closes_above_lower + other.closes_above_lower,
            closes_at_or_below_lower: self.closes_at_or_below_lower
                + other.closes_at_or_below_lower,
            both_close_above_upper: self.both_close_above_upper + other.both_close_above_upper,
            both_close_below_lower: self.both_close_below_lower + other.both_close_below_lower,
            both_close_between: self.both_close_between + other.both_close_between,
            points_above_upper_sum: self.points_above_upper_sum + other.points_above_upper_sum,
            points_below_lower_sum: self.points_below_lower_sum + other.points_below_lower_sum,
            close_points_above_upper_sum: self.close_points_above_upper_sum
                + other.close_points_above_upper_sum,
            close_points_below_lower_sum: self.close_points_below_lower_sum
                + other.close_points_below_lower_sum,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Mean high overshoot above Q1 over all tallied days.
    pub fn mean_points_above_upper(&self) -> Option<f64> {
        mean(self.points_above_upper_sum, self.total)
    }

    /// Mean low overshoot below Q4 over all tallied days.
    pub fn mean_points_below_lower(&self) -> Option<f64> {
        mean(self.points_below_lower_sum, self.total)
    }

    /// Mean close distance above Q1 over both-touched days.
    pub fn mean_close_points_above_upper(&self) -> Option<f64> {
        mean(self.close_points_above_upper_sum, self.touches_both)
    }

    /// Mean close distance below Q4 over both-touched days.
    pub fn mean_close_points_below_lower(&self) -> Option<f64> {
        mean(self.close_points_below_lower_sum, self.touches_both)
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

impl<'a> Sum<&'a TouchRecord> for TouchTally {
    fn sum<I: Iterator<Item = &'a TouchRecord>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, r| acc.merge(&Self::of(r)))
    }
}

impl Sum for TouchTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, t| acc.merge(&t))
    }
}

/// Tally the defined records of `bars` that pass `filter`.
///
/// `records[i]` must be the classification of `bars[i]`; undefined records
/// are skipped.
pub fn tally_records(
    bars: &[Bar],
    records: &[Option<TouchRecord>],
    filter: RecordFilter,
) -> TouchTally {
    bars.iter()
        .zip(records)
        .filter_map(|(bar, record)| record.as_ref().map(|r| (bar, r)))
        .filter(|(bar, record)| filter.accepts(bar, record))
        .map(|(_, record)| record)
        .sum()
}
