use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{DayEntry, PregnancyId};

/// Longest bleeding duration, in days, a cycle may record.
pub const MAX_DURATION: u32 = 31;

/// One recorded menstrual period and its tracked days.
///
/// Once generated, `days` covers exactly `[start_date, start_date + duration)`.
/// [`Cycle::set_duration`] and [`Cycle::set_start_date`] keep that true while
/// preserving whatever was already entered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cycle {
    /// Storage row id, assigned on first insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub start_date: NaiveDate,
    /// Number of bleeding days.
    pub duration: u32,
    #[serde(default)]
    pub days: Vec<DayEntry>,
    #[serde(default)]
    pub pregnancy_id: Option<PregnancyId>,
}

impl Cycle {
    pub fn new(start_date: NaiveDate, duration: u32) -> Self {
        Self {
            id: None,
            start_date,
            duration,
            days: Vec::new(),
            pregnancy_id: None,
        }
    }

    /// Replace `days` with one blank entry per bleeding day.
    pub fn generate_days(&mut self) {
        self.days = (0..self.duration)
            .map(|i| DayEntry::new(self.start_date + Duration::days(i as i64)))
            .collect();
    }

    /// Grow or shrink the trailing days, keeping data for indices that remain.
    pub fn set_duration(&mut self, duration: u32) {
        let target = duration as usize;
        if target < self.days.len() {
            self.days.truncate(target);
        } else {
            for i in self.days.len()..target {
                self.days
                    .push(DayEntry::new(self.start_date + Duration::days(i as i64)));
            }
        }
        self.duration = duration;
    }

    /// Move the cycle, re-dating every day entry by index.
    pub fn set_start_date(&mut self, start_date: NaiveDate) {
        self.start_date = start_date;
        for (i, day) in self.days.iter_mut().enumerate() {
            day.date = start_date + Duration::days(i as i64);
        }
    }

    /// Last bleeding day, or `None` for a zero-length cycle.
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self.duration {
            0 => None,
            n => Some(self.start_date + Duration::days(n as i64 - 1)),
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayEntry> {
        self.days.iter_mut().find(|d| d.date == date)
    }

    pub fn is_pregnant(&self) -> bool {
        self.pregnancy_id.is_some()
    }

    /// Whether `days` currently matches the covered interval exactly.
    pub fn days_consistent(&self) -> bool {
        self.days.len() == self.duration as usize
            && self
                .days
                .iter()
                .enumerate()
                .all(|(i, d)| d.date == self.start_date + Duration::days(i as i64))
    }
}
