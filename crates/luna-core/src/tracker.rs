//! In-memory cycle and pregnancy store backed by a [`Repository`].
//!
//! The tracker owns both collections. Every mutation validates first,
//! relinks pregnancies to cycles, persists the full snapshot and returns an
//! [`Event`]. If persisting fails the in-memory state is rolled back.

use chrono::NaiveDate;

use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::linker;
use crate::model::{Cycle, DayEntry, Pregnancy, PregnancyId, MAX_DURATION};
use crate::stats::CycleStats;
use crate::storage::{Config, Repository, Snapshot};

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Changes applied by [`Tracker::update_cycle`].
///
/// `days` entries replace the stored entry with the same date once the new
/// start date and duration are in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleEdit {
    pub start_date: Option<NaiveDate>,
    pub duration: Option<u32>,
    pub days: Vec<DayEntry>,
}

impl CycleEdit {
    pub fn start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn day(mut self, entry: DayEntry) -> Self {
        self.days.push(entry);
        self
    }
}

pub struct Tracker {
    data: Snapshot,
    repo: Box<dyn Repository>,
    clock: fn() -> NaiveDate,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("cycles", &self.data.cycles.len())
            .field("pregnancies", &self.data.pregnancies.len())
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Load everything from `repo`.
    pub fn open(repo: impl Repository + 'static) -> Result<Self> {
        let mut tracker = Self {
            data: Snapshot::default(),
            repo: Box::new(repo),
            clock: local_today,
        };
        tracker.data = tracker.read_repo()?;
        tracing::debug!(
            cycles = tracker.data.cycles.len(),
            pregnancies = tracker.data.pregnancies.len(),
            "opened tracker"
        );
        Ok(tracker)
    }

    /// Replace the date source used for bucket edges and predictions.
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    fn read_repo(&self) -> Result<Snapshot> {
        let mut snapshot = self.repo.load()?;
        linker::unlink_dangling(&mut snapshot.cycles, &snapshot.pregnancies);
        linker::sort_cycles(&mut snapshot.cycles);
        Ok(snapshot)
    }

    /// Persist the current snapshot, restoring `backup` if that fails.
    fn commit(&mut self, backup: Snapshot) -> Result<()> {
        if let Err(e) = self.repo.save(&self.data) {
            tracing::error!(error = %e, "failed to persist, rolling back");
            self.data = backup;
            return Err(e);
        }
        Ok(())
    }

    fn relink(&mut self) -> usize {
        let today = self.today();
        linker::relink_all(&mut self.data.cycles, &self.data.pregnancies, today)
    }

    fn linked_count(&self) -> usize {
        self.data.cycles.iter().filter(|c| c.is_pregnant()).count()
    }

    fn cycle_index(&self, start: NaiveDate) -> Result<usize> {
        self.data
            .cycles
            .iter()
            .position(|c| c.start_date == start)
            .ok_or_else(|| ValidationError::CycleNotFound(start).into())
    }

    fn pregnancy_index(&self, id: PregnancyId) -> Result<usize> {
        self.data
            .pregnancies
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ValidationError::PregnancyNotFound(id.to_string()).into())
    }

    fn check_duration(duration: u32) -> Result<()> {
        if duration > MAX_DURATION {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: format!("{duration} exceeds the maximum of {MAX_DURATION} days"),
            }
            .into());
        }
        Ok(())
    }

    /// Reject a pregnancy whose start date is taken by a different pregnancy.
    fn check_pregnancy_start(&self, start: NaiveDate, id: PregnancyId) -> Result<()> {
        if self
            .data
            .pregnancies
            .iter()
            .any(|p| p.start_date == start && p.id != id)
        {
            return Err(ValidationError::InvalidValue {
                field: "start_date".into(),
                message: format!("a pregnancy starting on {start} already exists"),
            }
            .into());
        }
        Ok(())
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    /// Cycles sorted ascending by start date.
    pub fn cycles(&self) -> &[Cycle] {
        &self.data.cycles
    }

    pub fn pregnancies(&self) -> &[Pregnancy] {
        &self.data.pregnancies
    }

    pub fn cycle(&self, start: NaiveDate) -> Option<&Cycle> {
        self.data.cycles.iter().find(|c| c.start_date == start)
    }

    pub fn pregnancy(&self, id: PregnancyId) -> Option<&Pregnancy> {
        self.data.pregnancies.iter().find(|p| p.id == id)
    }

    pub fn pregnancy_for(&self, cycle: &Cycle) -> Option<&Pregnancy> {
        linker::resolve(cycle, &self.data.pregnancies)
    }

    /// The latest cycle by start date.
    pub fn active_cycle(&self) -> Option<&Cycle> {
        self.data.cycles.iter().max_by_key(|c| c.start_date)
    }

    pub fn active_pregnancy(&self) -> Option<&Pregnancy> {
        self.active_cycle().and_then(|c| self.pregnancy_for(c))
    }

    pub fn add_cycle(&mut self, mut cycle: Cycle) -> Result<Event> {
        if self.cycle(cycle.start_date).is_some() {
            return Err(ValidationError::DuplicateStartDate(cycle.start_date).into());
        }
        Self::check_duration(cycle.duration)?;
        if cycle.days.is_empty() {
            cycle.generate_days();
        }

        let backup = self.data.clone();
        let start_date = cycle.start_date;
        self.data.cycles.push(cycle);
        let linked = self.relink();
        self.commit(backup)?;

        tracing::info!(start = %start_date, "added cycle");
        Ok(Event::CycleAdded { start_date, linked })
    }

    pub fn update_cycle(&mut self, original_start: NaiveDate, edit: CycleEdit) -> Result<Event> {
        let index = self.cycle_index(original_start)?;
        if let Some(duration) = edit.duration {
            Self::check_duration(duration)?;
        }
        let new_start = edit.start_date.unwrap_or(original_start);
        if new_start != original_start && self.cycle(new_start).is_some() {
            return Err(ValidationError::DuplicateStartDate(new_start).into());
        }

        let mut cycle = self.data.cycles[index].clone();
        cycle.set_start_date(new_start);
        if let Some(duration) = edit.duration {
            cycle.set_duration(duration);
        }
        for entry in edit.days {
            let date = entry.date;
            let slot = cycle.day_mut(date).ok_or_else(|| ValidationError::InvalidValue {
                field: "days".into(),
                message: format!("{date} is outside the cycle starting {new_start}"),
            })?;
            *slot = entry;
        }

        let backup = self.data.clone();
        self.data.cycles[index] = cycle;
        let linked = self.relink();
        self.commit(backup)?;

        tracing::info!(start = %new_start, previous = %original_start, "updated cycle");
        Ok(Event::CycleUpdated {
            start_date: new_start,
            previous_start_date: (new_start != original_start).then_some(original_start),
            linked,
        })
    }

    pub fn delete_cycle(&mut self, start: NaiveDate) -> Result<Event> {
        let index = self.cycle_index(start)?;

        let backup = self.data.clone();
        self.data.cycles.remove(index);
        let linked = self.relink();
        self.commit(backup)?;

        tracing::info!(start = %start, "deleted cycle");
        Ok(Event::CycleDeleted {
            start_date: start,
            linked,
        })
    }

    /// Overwrite the entry for `entry.date` inside the cycle starting `start`.
    pub fn set_day(&mut self, start: NaiveDate, entry: DayEntry) -> Result<Event> {
        let index = self.cycle_index(start)?;
        if self.data.cycles[index].day(entry.date).is_none() {
            return Err(ValidationError::InvalidValue {
                field: "date".into(),
                message: format!("{} is outside the cycle starting {start}", entry.date),
            }
            .into());
        }

        let backup = self.data.clone();
        if let Some(slot) = self.data.cycles[index].day_mut(entry.date) {
            *slot = entry;
        }
        self.commit(backup)?;

        Ok(Event::CycleUpdated {
            start_date: start,
            previous_start_date: None,
            linked: self.linked_count(),
        })
    }

    /// Store a new pregnancy and link it without disturbing existing links.
    pub fn add_pregnancy(&mut self, pregnancy: Pregnancy) -> Result<Event> {
        if self.pregnancy(pregnancy.id).is_some() {
            return Err(ValidationError::InvalidValue {
                field: "id".into(),
                message: format!("pregnancy {} already exists", pregnancy.id),
            }
            .into());
        }
        self.check_pregnancy_start(pregnancy.start_date, pregnancy.id)?;

        let backup = self.data.clone();
        let today = self.today();
        let index = linker::link_single(&pregnancy, &mut self.data.cycles, today);
        let id = pregnancy.id;
        self.data.pregnancies.push(pregnancy);
        self.commit(backup)?;

        let cycle = index.map(|i| self.data.cycles[i].start_date);
        tracing::info!(pregnancy = %id, cycle = ?cycle, "added pregnancy");
        Ok(Event::PregnancyAdded { id, cycle })
    }

    pub fn update_pregnancy(&mut self, pregnancy: Pregnancy) -> Result<Event> {
        let index = self.pregnancy_index(pregnancy.id)?;
        self.check_pregnancy_start(pregnancy.start_date, pregnancy.id)?;

        let backup = self.data.clone();
        let id = pregnancy.id;
        self.data.pregnancies[index] = pregnancy;
        let linked = self.relink();
        self.commit(backup)?;

        tracing::info!(pregnancy = %id, "updated pregnancy");
        Ok(Event::PregnancyUpdated { id, linked })
    }

    pub fn delete_pregnancy(&mut self, id: PregnancyId) -> Result<Event> {
        let index = self.pregnancy_index(id)?;

        let backup = self.data.clone();
        self.data.pregnancies.remove(index);
        let linked = self.relink();
        self.commit(backup)?;

        tracing::info!(pregnancy = %id, "deleted pregnancy");
        Ok(Event::PregnancyDeleted { id, linked })
    }

    /// Pregnancy switch on a cycle. Only the latest cycle can be toggled.
    ///
    /// Turning it on creates a pregnancy dated at the cycle start, or moves
    /// the already linked one there. Turning it off deletes the linked
    /// pregnancy; with nothing linked that is a no-op reported as
    /// [`Event::CycleUpdated`].
    ///
    /// A cycle that starts today has an empty bucket, so the pregnancy is
    /// pinned to it directly. That pin only lasts until the next relink on
    /// the same day (for example [`Tracker::update_pregnancy`]); from the
    /// following day the bucket covers the start date and the link holds.
    pub fn set_pregnancy(&mut self, start: NaiveDate, on: bool) -> Result<Event> {
        let index = self.cycle_index(start)?;
        if self.active_cycle().map(|c| c.start_date) != Some(start) {
            return Err(ValidationError::NotLatestCycle(start).into());
        }
        let linked = self.pregnancy_for(&self.data.cycles[index]).map(|p| p.id);

        match (on, linked) {
            (true, Some(id)) => {
                self.check_pregnancy_start(start, id)?;
                let backup = self.data.clone();
                let pi = self.pregnancy_index(id)?;
                self.data.pregnancies[pi].start_date = start;
                self.relink();
                self.pin_to_latest(id);
                self.commit(backup)?;
                tracing::info!(pregnancy = %id, cycle = %start, "re-dated pregnancy");
                Ok(Event::PregnancyUpdated {
                    id,
                    linked: self.linked_count(),
                })
            }
            (true, None) => {
                let pregnancy = Pregnancy::new(start);
                let id = pregnancy.id;
                self.add_pregnancy(pregnancy)?;
                let backup = self.data.clone();
                if self.pin_to_latest(id) {
                    self.commit(backup)?;
                }
                Ok(Event::PregnancyAdded {
                    id,
                    cycle: Some(start),
                })
            }
            (false, Some(id)) => self.delete_pregnancy(id),
            (false, None) => Ok(Event::CycleUpdated {
                start_date: start,
                previous_start_date: None,
                linked: self.linked_count(),
            }),
        }
    }

    /// Link `id` to the latest cycle when bucketing missed it, which happens
    /// while the latest cycle started today. Returns whether a link changed.
    fn pin_to_latest(&mut self, id: PregnancyId) -> bool {
        match self.data.cycles.last_mut() {
            Some(latest) if latest.pregnancy_id != Some(id) => {
                latest.pregnancy_id = Some(id);
                true
            }
            _ => false,
        }
    }

    /// Statistics over the current cycles using the configured defaults.
    pub fn stats(&self, config: &Config) -> CycleStats<'_> {
        CycleStats::new(
            &self.data.cycles,
            config.cycle.cycle_length,
            config.cycle.luteal_phase_length,
        )
    }

    /// Throw away in-memory state and load it again from storage.
    pub fn reload(&mut self) -> Result<Event> {
        self.data = self.read_repo()?;
        tracing::debug!("reloaded tracker");
        Ok(Event::Reloaded {
            cycles: self.data.cycles.len(),
            pregnancies: self.data.pregnancies.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::model::Flow;
    use crate::storage::Database;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 3, 10)
    }

    fn tracker() -> Tracker {
        Tracker::open(Database::open_memory().unwrap())
            .unwrap()
            .with_clock(today)
    }

    fn with_cycles(starts: &[NaiveDate]) -> Tracker {
        let mut t = tracker();
        for &s in starts {
            t.add_cycle(Cycle::new(s, 5)).unwrap();
        }
        t
    }

    /// Accepts nothing, for rollback tests.
    struct BrokenRepo;

    impl Repository for BrokenRepo {
        fn load(&self) -> Result<Snapshot> {
            Ok(Snapshot::default())
        }

        fn save(&mut self, _: &Snapshot) -> Result<()> {
            Err(crate::error::DatabaseError::Locked.into())
        }
    }

    #[test]
    fn add_cycle_generates_days_and_rejects_duplicates() {
        let mut t = tracker();
        let event = t.add_cycle(Cycle::new(date(2025, 1, 1), 4)).unwrap();

        assert_eq!(
            event,
            Event::CycleAdded {
                start_date: date(2025, 1, 1),
                linked: 0
            }
        );
        assert_eq!(t.cycle(date(2025, 1, 1)).unwrap().days.len(), 4);
        assert!(matches!(
            t.add_cycle(Cycle::new(date(2025, 1, 1), 2)),
            Err(CoreError::Validation(ValidationError::DuplicateStartDate(_)))
        ));
    }

    #[test]
    fn oversized_duration_is_rejected() {
        let mut t = tracker();
        let too_long = Cycle::new(date(2025, 1, 1), 4_000_000_000);
        assert!(matches!(
            t.add_cycle(too_long),
            Err(CoreError::Validation(ValidationError::InvalidValue { .. }))
        ));
        assert!(t.cycles().is_empty());

        t.add_cycle(Cycle::new(date(2025, 1, 1), MAX_DURATION)).unwrap();
        assert!(matches!(
            t.update_cycle(date(2025, 1, 1), CycleEdit::default().duration(MAX_DURATION + 1)),
            Err(CoreError::Validation(ValidationError::InvalidValue { .. }))
        ));
        assert_eq!(t.cycle(date(2025, 1, 1)).unwrap().days.len(), MAX_DURATION as usize);
    }

    #[test]
    fn pin_on_cycle_starting_today_lasts_until_next_relink() {
        let mut t = with_cycles(&[today()]);
        t.set_pregnancy(today(), true).unwrap();
        let mut p = t.active_pregnancy().unwrap().clone();

        p.confirmed = true;
        t.update_pregnancy(p).unwrap();

        assert!(t.active_pregnancy().is_none());
    }

    #[test]
    fn cycles_stay_sorted_and_active_is_latest() {
        let t = with_cycles(&[date(2025, 2, 1), date(2025, 1, 1)]);

        assert_eq!(t.cycles()[0].start_date, date(2025, 1, 1));
        assert_eq!(t.active_cycle().unwrap().start_date, date(2025, 2, 1));
        assert!(tracker().active_cycle().is_none());
    }

    #[test]
    fn moving_a_cycle_relinks_pregnancies() {
        let mut t = with_cycles(&[date(2025, 1, 1), date(2025, 2, 1)]);
        let p = Pregnancy::new(date(2025, 1, 20));
        t.add_pregnancy(p.clone()).unwrap();
        assert_eq!(t.cycles()[0].pregnancy_id, Some(p.id));

        let event = t
            .update_cycle(date(2025, 2, 1), CycleEdit::default().start_date(date(2025, 1, 15)))
            .unwrap();

        assert_eq!(
            event,
            Event::CycleUpdated {
                start_date: date(2025, 1, 15),
                previous_start_date: Some(date(2025, 2, 1)),
                linked: 1
            }
        );
        assert!(t.cycles()[0].pregnancy_id.is_none());
        assert_eq!(t.cycles()[1].pregnancy_id, Some(p.id));
        assert_eq!(t.cycles()[1].days[0].date, date(2025, 1, 15));
    }

    #[test]
    fn update_cycle_resizes_and_applies_days() {
        let mut t = with_cycles(&[date(2025, 1, 1)]);
        let mut heavy = DayEntry::new(date(2025, 1, 6));
        heavy.flow = Some(Flow::Heavy);

        t.update_cycle(date(2025, 1, 1), CycleEdit::default().duration(6).day(heavy))
            .unwrap();

        let cycle = t.cycle(date(2025, 1, 1)).unwrap();
        assert_eq!(cycle.days.len(), 6);
        assert_eq!(cycle.days[5].flow, Some(Flow::Heavy));

        let outside = DayEntry::new(date(2025, 2, 1));
        assert!(t
            .update_cycle(date(2025, 1, 1), CycleEdit::default().day(outside))
            .is_err());
    }

    #[test]
    fn delete_missing_cycle_is_an_error() {
        let mut t = with_cycles(&[date(2025, 1, 1)]);
        assert!(matches!(
            t.delete_cycle(date(2025, 5, 5)),
            Err(CoreError::Validation(ValidationError::CycleNotFound(_)))
        ));
        t.delete_cycle(date(2025, 1, 1)).unwrap();
        assert!(t.cycles().is_empty());
    }

    #[test]
    fn set_day_overwrites_one_entry() {
        let mut t = with_cycles(&[date(2025, 1, 1)]);
        let mut entry = DayEntry::new(date(2025, 1, 2));
        entry.mood = Some("tired".into());

        t.set_day(date(2025, 1, 1), entry).unwrap();

        let cycle = t.cycle(date(2025, 1, 1)).unwrap();
        assert_eq!(cycle.days[1].mood.as_deref(), Some("tired"));
        assert!(t.set_day(date(2025, 1, 1), DayEntry::new(date(2025, 1, 9))).is_err());
    }

    #[test]
    fn pregnancy_start_dates_must_be_unique() {
        let mut t = with_cycles(&[date(2025, 1, 1)]);
        t.add_pregnancy(Pregnancy::new(date(2025, 1, 5))).unwrap();

        assert!(t.add_pregnancy(Pregnancy::new(date(2025, 1, 5))).is_err());
        assert_eq!(t.pregnancies().len(), 1);
    }

    #[test]
    fn deleting_pregnancy_unlinks_cycle() {
        let mut t = with_cycles(&[date(2025, 1, 1)]);
        let p = Pregnancy::new(date(2025, 1, 5));
        t.add_pregnancy(p.clone()).unwrap();
        assert_eq!(t.active_pregnancy().map(|x| x.id), Some(p.id));

        let event = t.delete_pregnancy(p.id).unwrap();

        assert_eq!(event, Event::PregnancyDeleted { id: p.id, linked: 0 });
        assert!(t.active_pregnancy().is_none());
        assert!(t.delete_pregnancy(p.id).is_err());
    }

    #[test]
    fn toggle_only_on_latest_cycle() {
        let mut t = with_cycles(&[date(2025, 1, 1), date(2025, 2, 1)]);

        assert!(matches!(
            t.set_pregnancy(date(2025, 1, 1), true),
            Err(CoreError::Validation(ValidationError::NotLatestCycle(_)))
        ));

        t.set_pregnancy(date(2025, 2, 1), true).unwrap();
        let p = t.active_pregnancy().unwrap().clone();
        assert_eq!(p.start_date, date(2025, 2, 1));

        t.set_pregnancy(date(2025, 2, 1), false).unwrap();
        assert!(t.pregnancies().is_empty());
        assert!(t.cycles().iter().all(|c| !c.is_pregnant()));
    }

    #[test]
    fn toggle_on_redates_existing_pregnancy() {
        let mut t = with_cycles(&[date(2025, 2, 1)]);
        let p = Pregnancy::new(date(2025, 2, 14));
        t.add_pregnancy(p.clone()).unwrap();

        t.set_pregnancy(date(2025, 2, 1), true).unwrap();

        assert_eq!(t.pregnancies().len(), 1);
        assert_eq!(t.pregnancy(p.id).unwrap().start_date, date(2025, 2, 1));
    }

    #[test]
    fn toggle_on_cycle_starting_today_still_links() {
        let mut t = with_cycles(&[today()]);

        t.set_pregnancy(today(), true).unwrap();

        assert!(t.active_pregnancy().is_some());
    }

    #[test]
    fn failed_save_rolls_back() {
        let mut t = Tracker::open(BrokenRepo).unwrap().with_clock(today);

        assert!(t.add_cycle(Cycle::new(date(2025, 1, 1), 5)).is_err());
        assert!(t.cycles().is_empty());
    }

    #[test]
    fn stats_skip_pregnant_cycles() {
        let mut t = with_cycles(&[date(2025, 1, 1), date(2025, 1, 29), date(2025, 2, 26)]);
        t.add_pregnancy(Pregnancy::new(date(2025, 3, 1))).unwrap();

        let stats = t.stats(&Config::default());

        assert_eq!(stats.cycle_count(), 2);
        assert_eq!(stats.average_cycle_length(), 28.0);
    }
}
