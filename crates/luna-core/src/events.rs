use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::PregnancyId;

/// Every tracker mutation returns an Event describing what changed.
/// The caller decides what to refresh; nothing is broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    CycleAdded {
        start_date: NaiveDate,
        /// Cycles carrying a pregnancy link after relinking.
        linked: usize,
    },
    CycleUpdated {
        start_date: NaiveDate,
        /// Start date before the edit, when it moved.
        previous_start_date: Option<NaiveDate>,
        linked: usize,
    },
    CycleDeleted {
        start_date: NaiveDate,
        linked: usize,
    },
    PregnancyAdded {
        id: PregnancyId,
        /// Start date of the cycle it was linked to.
        cycle: Option<NaiveDate>,
    },
    PregnancyUpdated {
        id: PregnancyId,
        linked: usize,
    },
    PregnancyDeleted {
        id: PregnancyId,
        linked: usize,
    },
    /// In-memory collections were replaced from storage.
    Reloaded {
        cycles: usize,
        pregnancies: usize,
    },
}
