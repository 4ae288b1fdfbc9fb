//! Skew-adjusted zone levels inside an expected-move band.
//!
//! With Q1 = EMH, Q4 = EML and the day's open as NR2, the side of the band
//! holding the larger share of the range is "dominant". Its distance from a
//! balanced 50% (the differential, in percentage points) widens the zone
//! fractions 34.1% and 37.5%.

use super::rounding::round_to_tick;
use serde::{Deserialize, Serialize};

const TC_HIGH: f64 = 0.125;
const TC_LOW: f64 = 0.159;
const TV_HIGH: f64 = 0.875;
const TV_LOW: f64 = 0.9375;
const ZONE_NEAR_PCT: f64 = 34.1;
const ZONE_FAR_PCT: f64 = 37.5;

/// Skew level set for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewLevels {
    pub pct_above: f64,
    pub pct_below: f64,
    pub dominant_pct: f64,
    pub differential: f64,
    pub tch: f64,
    pub tcl: f64,
    pub tvh: f64,
    pub tvl: f64,
    /// Zone levels are rounded to the nearest tick.
    pub z2h: f64,
    pub z2l: f64,
    pub z3h: f64,
    pub z3l: f64,
    pub q2: f64,
    pub q3: f64,
}

impl SkewLevels {
    pub const FIELD_NAMES: [&'static str; 14] = [
        "pct_above",
        "pct_below",
        "dominant_pct",
        "differential",
        "tch",
        "tcl",
        "tvh",
        "tvl",
        "z2h",
        "z2l",
        "z3h",
        "z3l",
        "q2",
        "q3",
    ];

    /// Derive skew levels from the band `[q4, q1]` and reference `nr2`.
    ///
    /// Returns `None` when the range is not positive.
    pub fn compute(q1: f64, q4: f64, nr2: f64) -> Option<Self> {
        let range = q1 - q4;
        if range.is_nan() || range <= 0.0 {
            return None;
        }

        let pct_above = (q1 - nr2) / range * 100.0;
        let pct_below = (nr2 - q4) / range * 100.0;
        let dominant_pct = pct_above.max(pct_below);
        let differential = (dominant_pct - 50.0).abs();

        let tch = q1 - TC_HIGH * range;
        let tcl = q1 - TC_LOW * range;
        let tvh = q1 - TV_HIGH * range;
        let tvl = q1 - TV_LOW * range;

        let near = (ZONE_NEAR_PCT + differential) / 100.0 * range;
        let far = (ZONE_FAR_PCT + differential) / 100.0 * range;
        let z2h = round_to_tick(q1 - near);
        let z2l = round_to_tick(q1 - far);
        let z3h = round_to_tick(q4 + far);
        let z3l = round_to_tick(q4 + near);

        Some(Self {
            pct_above,
            pct_below,
            dominant_pct,
            differential,
            tch,
            tcl,
            tvh,
            tvl,
            z2h,
            z2l,
            z3h,
            z3l,
            q2: (tcl + z2h) / 2.0,
            q3: (tvh + z3l) / 2.0,
        })
    }

    pub fn values(&self) -> [f64; 14] {
        [
            self.pct_above,
            self.pct_below,
            self.dominant_pct,
            self.differential,
            self.tch,
            self.tcl,
            self.tvh,
            self.tvl,
            self.z2h,
            self.z2l,
            self.z3h,
            self.z3l,
            self.q2,
            self.q3,
        ]
    }
}
