//! BarSeries: chronologically ordered daily bars with unique dates.

use super::bar::Bar;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("bar series is empty")]
    Empty,

    #[error("duplicate date {date} at index {index}")]
    DuplicateDate { date: NaiveDate, index: usize },

    #[error("date {date} at index {index} precedes {previous}")]
    OutOfOrder {
        date: NaiveDate,
        previous: NaiveDate,
        index: usize,
    },
}

/// Immutable, strictly date-increasing sequence of bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, rejecting empty input, duplicate dates and unordered dates.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }
        for (index, pair) in bars.windows(2).enumerate() {
            let (previous, current) = (pair[0].date, pair[1].date);
            if current == previous {
                return Err(SeriesError::DuplicateDate {
                    date: current,
                    index: index + 1,
                });
            }
            if current < previous {
                return Err(SeriesError::OutOfOrder {
                    date: current,
                    previous,
                    index: index + 1,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// The `len` bars strictly preceding index `i`, or `None` if fewer exist.
    pub fn window_before(&self, i: usize, len: usize) -> Option<&[Bar]> {
        if len == 0 || i < len || i > self.bars.len() {
            return None;
        }
        Some(&self.bars[i - len..i])
    }

    /// Calendar years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.bars.iter().map(|b| b.date.year()).collect();
        years.dedup();
        years
    }

    /// Series truncated to the first `n` bars. Used for look-ahead checks.
    pub fn truncated(&self, n: usize) -> Result<Self, SeriesError> {
        Self::new(self.bars[..n.min(self.bars.len())].to_vec())
    }
}
