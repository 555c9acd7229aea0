//! Integration tests for the tracker over real storage backends.

use chrono::NaiveDate;
use luna_core::storage::Snapshot;
use luna_core::{
    import_legacy, Config, Cycle, CycleEdit, Database, DayEntry, Event, Flow, LegacyStore,
    Pregnancy, Repository, Tracker,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2026, 1, 10)
}

fn filled_cycle() -> Cycle {
    let mut cycle = Cycle::new(date(2025, 11, 1), 4);
    cycle.generate_days();
    cycle.days[0].flow = Some(Flow::Heavy);
    cycle.days[0].symptoms = vec!["cramps".into(), "headache".into()];
    cycle.days[1].temperature = Some(36.7);
    cycle.days[2].mood = Some("calm".into());
    cycle.days[3].notes = Some("light spotting".into());
    cycle
}

fn strip_ids(cycles: &[Cycle]) -> Vec<Cycle> {
    cycles
        .iter()
        .cloned()
        .map(|mut c| {
            c.id = None;
            c
        })
        .collect()
}

#[test]
fn test_cycle_survives_database_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("luna.db");
    let cycle = filled_cycle();

    {
        let mut tracker = Tracker::open(Database::open_at(&path).unwrap())
            .unwrap()
            .with_clock(today);
        tracker.add_cycle(cycle.clone()).unwrap();
    }

    let tracker = Tracker::open(Database::open_at(&path).unwrap()).unwrap();
    assert_eq!(strip_ids(tracker.cycles()), vec![cycle]);
}

#[test]
fn test_cycle_survives_legacy_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let cycle = filled_cycle();

    {
        let mut tracker = Tracker::open(LegacyStore::open(dir.path()).unwrap())
            .unwrap()
            .with_clock(today);
        tracker.add_cycle(cycle.clone()).unwrap();
    }

    let tracker = Tracker::open(LegacyStore::open(dir.path()).unwrap()).unwrap();
    assert_eq!(tracker.cycles(), &[cycle][..]);
}

#[test]
fn test_pregnancy_links_to_interrupted_cycle() {
    let mut tracker = Tracker::open(Database::open_memory().unwrap())
        .unwrap()
        .with_clock(today);
    tracker.add_cycle(Cycle::new(date(2025, 11, 1), 5)).unwrap();
    tracker.add_cycle(Cycle::new(date(2025, 12, 1), 5)).unwrap();

    let pregnancy = Pregnancy::new(date(2025, 11, 16));
    let event = tracker.add_pregnancy(pregnancy.clone()).unwrap();

    assert_eq!(
        event,
        Event::PregnancyAdded {
            id: pregnancy.id,
            cycle: Some(date(2025, 11, 1)),
        }
    );
    let november = tracker.cycle(date(2025, 11, 1)).unwrap();
    let december = tracker.cycle(date(2025, 12, 1)).unwrap();
    assert_eq!(tracker.pregnancy_for(november), Some(&pregnancy));
    assert_eq!(tracker.pregnancy_for(december), None);
    assert!(tracker.active_pregnancy().is_none());
}

#[test]
fn test_stats_follow_pregnancy_changes() {
    let mut tracker = Tracker::open(Database::open_memory().unwrap())
        .unwrap()
        .with_clock(today);
    for start in [date(2025, 9, 1), date(2025, 9, 29), date(2025, 10, 27)] {
        tracker.add_cycle(Cycle::new(start, 5)).unwrap();
    }
    let config = Config::default();
    assert_eq!(tracker.stats(&config).cycle_count(), 3);

    let pregnancy = Pregnancy::new(date(2025, 11, 2));
    tracker.add_pregnancy(pregnancy.clone()).unwrap();
    assert_eq!(tracker.stats(&config).cycle_count(), 2);
    assert_eq!(
        tracker.stats(&config).predicted_next_period(),
        Some(date(2025, 10, 27))
    );

    tracker.delete_pregnancy(pregnancy.id).unwrap();
    assert_eq!(tracker.stats(&config).cycle_count(), 3);
}

#[test]
fn test_reload_replaces_in_memory_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("luna.db");
    let mut tracker = Tracker::open(Database::open_at(&path).unwrap())
        .unwrap()
        .with_clock(today);
    tracker.add_cycle(Cycle::new(date(2025, 12, 1), 5)).unwrap();

    // another writer replaces the store behind the tracker's back
    let mut other = Database::open_at(&path).unwrap();
    other
        .save(&Snapshot {
            cycles: vec![Cycle::new(date(2025, 6, 1), 3), Cycle::new(date(2025, 7, 1), 3)],
            pregnancies: Vec::new(),
        })
        .unwrap();

    let event = tracker.reload().unwrap();

    assert_eq!(
        event,
        Event::Reloaded {
            cycles: 2,
            pregnancies: 0
        }
    );
    assert!(tracker.cycle(date(2025, 12, 1)).is_none());
    assert_eq!(tracker.active_cycle().unwrap().start_date, date(2025, 7, 1));
}

#[test]
fn test_legacy_import_then_track() {
    let dir = tempfile::tempdir().unwrap();
    let mut legacy = LegacyStore::open(dir.path().join("legacy")).unwrap();
    let pregnancy = Pregnancy::new(date(2025, 11, 20));
    let mut linked = filled_cycle();
    linked.pregnancy_id = Some(pregnancy.id);
    legacy
        .save(&Snapshot {
            cycles: vec![linked],
            pregnancies: vec![pregnancy.clone()],
        })
        .unwrap();

    let mut db = Database::open_at(dir.path().join("luna.db")).unwrap();
    let summary = import_legacy(&legacy, &mut db).unwrap();
    assert_eq!(summary.imported_cycles, 1);
    assert_eq!(summary.imported_pregnancies, 1);

    let mut tracker = Tracker::open(db).unwrap().with_clock(today);
    assert_eq!(tracker.active_pregnancy(), Some(&pregnancy));

    let mut entry = DayEntry::new(date(2025, 11, 2));
    entry.flow = Some(Flow::Medium);
    tracker
        .update_cycle(date(2025, 11, 1), CycleEdit::default().duration(2).day(entry))
        .unwrap();

    let cycle = tracker.active_cycle().unwrap();
    assert_eq!(cycle.days.len(), 2);
    assert_eq!(cycle.days[1].flow, Some(Flow::Medium));
    assert!(cycle.is_pregnant());
}
