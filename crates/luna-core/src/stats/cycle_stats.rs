//! Interval statistics and predictions over a cycle history.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Phase;
use crate::model::Cycle;

/// Days either side of the predicted ovulation date counted as ovulating.
pub const OVULATION_WINDOW_DAYS: i64 = 2;

/// Snapshot of every statistic, for display or JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsSummary {
    pub cycle_count: usize,
    pub average_cycle_length: f64,
    pub cycle_length_std_dev: f64,
    pub cycle_length_range: String,
    pub predicted_next_period: Option<NaiveDate>,
    pub predicted_ovulation: Option<NaiveDate>,
    /// Negative once the predicted date has passed.
    pub days_until_next_period: Option<i64>,
    pub is_ovulating: bool,
    pub phase: Phase,
}

/// Statistics over the cycles that have no linked pregnancy.
///
/// `default_cycle_length` stands in for the average whenever fewer than two
/// usable cycles exist; `luteal_phase_length` is the fixed gap between
/// ovulation and the next period. Every query is total.
#[derive(Debug, Clone)]
pub struct CycleStats<'a> {
    cycles: Vec<&'a Cycle>,
    default_cycle_length: u32,
    luteal_phase_length: u32,
}

impl<'a> CycleStats<'a> {
    pub fn new(cycles: &'a [Cycle], default_cycle_length: u32, luteal_phase_length: u32) -> Self {
        let mut cycles: Vec<&Cycle> = cycles.iter().filter(|c| !c.is_pregnant()).collect();
        cycles.sort_by_key(|c| c.start_date);
        Self {
            cycles,
            default_cycle_length,
            luteal_phase_length,
        }
    }

    /// Number of cycles that feed the statistics.
    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    /// Gaps in days between consecutive cycle starts.
    pub fn intervals(&self) -> Vec<i64> {
        self.cycles
            .windows(2)
            .map(|w| (w[1].start_date - w[0].start_date).num_days())
            .collect()
    }

    /// Mean interval, or the configured default when there are no intervals.
    pub fn average_cycle_length(&self) -> f64 {
        let intervals = self.intervals();
        if intervals.is_empty() {
            return self.default_cycle_length as f64;
        }
        intervals.iter().sum::<i64>() as f64 / intervals.len() as f64
    }

    /// Sample standard deviation of the intervals; 0.0 below two samples.
    pub fn cycle_length_std_dev(&self) -> f64 {
        let intervals = self.intervals();
        if intervals.len() < 2 {
            return 0.0;
        }
        let n = intervals.len() as f64;
        let mean = intervals.iter().sum::<i64>() as f64 / n;
        let variance = intervals
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        variance.sqrt()
    }

    /// `"{min}-{max} days"`, or `"-"` without intervals.
    pub fn cycle_length_range(&self) -> String {
        let intervals = self.intervals();
        match (intervals.iter().min(), intervals.iter().max()) {
            (Some(min), Some(max)) => format!("{min}-{max} days"),
            _ => "-".to_string(),
        }
    }

    /// Whole days used for forecasting: the truncated average, or the
    /// default if that comes out as zero.
    fn forecast_length(&self) -> i64 {
        match self.average_cycle_length().trunc() as i64 {
            0 => self.default_cycle_length as i64,
            days => days,
        }
    }

    /// Latest start date plus the truncated average cycle length.
    pub fn predicted_next_period(&self) -> Option<NaiveDate> {
        let last = self.cycles.last()?;
        Some(last.start_date + Duration::days(self.forecast_length()))
    }

    pub fn predicted_ovulation(&self) -> Option<NaiveDate> {
        let next = self.predicted_next_period()?;
        Some(next - Duration::days(self.luteal_phase_length as i64))
    }

    /// True within ±2 days (inclusive) of the predicted ovulation.
    pub fn is_ovulating(&self, today: NaiveDate) -> bool {
        let Some(ovulation) = self.predicted_ovulation() else {
            return false;
        };
        let window = Duration::days(OVULATION_WINDOW_DAYS);
        ovulation - window <= today && today <= ovulation + window
    }

    pub fn current_phase(&self, today: NaiveDate) -> Phase {
        let Some(last) = self.cycles.last() else {
            return Phase::Unknown;
        };

        let day_in_cycle = (today - last.start_date).num_days() + 1;
        if day_in_cycle < 1 || day_in_cycle > self.forecast_length() {
            return Phase::Unknown;
        }

        if day_in_cycle <= last.duration as i64 {
            return Phase::Menstruation;
        }

        let luteal = Duration::days(self.luteal_phase_length as i64);
        match self.predicted_ovulation() {
            Some(ovulation) if today < ovulation - luteal => Phase::Follicular,
            _ if self.is_ovulating(today) => Phase::Ovulation,
            _ => Phase::Luteal,
        }
    }

    pub fn summary(&self, today: NaiveDate) -> StatsSummary {
        let predicted_next_period = self.predicted_next_period();
        StatsSummary {
            cycle_count: self.cycle_count(),
            average_cycle_length: self.average_cycle_length(),
            cycle_length_std_dev: self.cycle_length_std_dev(),
            cycle_length_range: self.cycle_length_range(),
            predicted_next_period,
            predicted_ovulation: self.predicted_ovulation(),
            days_until_next_period: predicted_next_period.map(|d| (d - today).num_days()),
            is_ovulating: self.is_ovulating(today),
            phase: self.current_phase(today),
        }
    }
}
