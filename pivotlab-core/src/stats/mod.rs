//! Statistics over touch/close records.
//!
//! [`TouchTally`] is the single accumulator: counts and magnitude sums with an
//! associative, commutative `merge`. Report tables ([`StatTable`]) are derived
//! from a tally on demand.

pub mod expected_move;
pub mod summary;
pub mod tally;

pub use expected_move::ExpectedMoveSummary;
pub use summary::{percentage, MethodStatistics, StatRow, StatTable, StatValue, TableKind};
pub use tally::{tally_records, RecordFilter, TouchTally};
