//! Bar: one trading day of a single instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
///
/// Validity (`is_sane`) is derived, never stored. Level engines and the
/// classifier read the fields as given and do not re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Market-logic check: low <= {open, close} <= high, positive prices and volume.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
            && self.volume > 0
    }

    /// Up day: close strictly above open. A flat day counts as down.
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
