//! Plain data records: cycles, their per-day entries, and pregnancies.
//!
//! Cycles and pregnancies live in separate collections. A cycle refers to
//! its pregnancy only through [`PregnancyId`]; resolving the id is the
//! linker's job (see [`crate::linker::resolve`]).

mod cycle;
mod day;
mod pregnancy;

pub use cycle::{Cycle, MAX_DURATION};
pub use day::{DayEntry, Flow};
pub use pregnancy::{Pregnancy, PregnancyId, Trimester, GESTATION_DAYS};
