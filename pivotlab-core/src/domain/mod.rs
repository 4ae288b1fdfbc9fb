//! Domain types: daily bars and the ordered series they form.

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::{BarSeries, SeriesError};

/// Default epsilon for floating-point level comparisons in tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;
