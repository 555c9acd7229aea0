//! Cycle-length statistics and forward predictions.
//!
//! [`CycleStats`] works on the cycles that are *not* linked to a pregnancy,
//! since a pregnancy pauses the natural cycle and would skew the intervals.

mod cycle_stats;
mod phase;

pub use cycle_stats::{CycleStats, StatsSummary, OVULATION_WINDOW_DAYS};
pub use phase::Phase;
