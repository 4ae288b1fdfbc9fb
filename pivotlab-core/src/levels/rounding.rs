//! Quarter-tick price rounding.
//!
//! Two rules coexist: expected-move pivots round *up* to the next tick,
//! skew zone levels round to the *nearest* tick (ties to even).

/// Instrument tick size.
pub const TICK: f64 = 0.25;

/// Tolerance for treating a scaled price as already on a tick.
const TICK_EPSILON: f64 = 1e-9;

/// Round up to the next multiple of [`TICK`].
///
/// A value already on a tick is unchanged. Values `<= 0` pass through
/// unrounded.
pub fn ceil_to_tick(value: f64) -> f64 {
    if value <= 0.0 || !value.is_finite() {
        return value;
    }
    let scaled = value / TICK;
    let nearest = scaled.round();
    if (scaled - nearest).abs() < TICK_EPSILON {
        return nearest * TICK;
    }
    scaled.ceil() * TICK
}

/// Round to the nearest multiple of [`TICK`], half-way cases to the even tick.
pub fn round_to_tick(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value / TICK).round_ties_even() * TICK
}

/// Whether `value` lies on the tick grid.
pub fn is_on_tick(value: f64) -> bool {
    let scaled = value / TICK;
    (scaled - scaled.round()).abs() < TICK_EPSILON
}
