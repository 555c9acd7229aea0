//! Integration tests for pregnancy-to-cycle linking.

use chrono::{Duration, NaiveDate};
use luna_core::linker::{bucket_index, relink_all, resolve, unlink_dangling};
use luna_core::{Cycle, Pregnancy};
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn base() -> NaiveDate {
    date(2024, 1, 1)
}

fn cycles_at(offsets: &[i64]) -> Vec<Cycle> {
    offsets
        .iter()
        .map(|&o| Cycle::new(base() + Duration::days(o), 5))
        .collect()
}

fn links(cycles: &[Cycle]) -> Vec<(NaiveDate, Option<luna_core::PregnancyId>)> {
    cycles.iter().map(|c| (c.start_date, c.pregnancy_id)).collect()
}

#[test]
fn test_pregnancy_links_to_interrupted_cycle() {
    let mut cycles = vec![Cycle::new(date(2025, 11, 1), 5), Cycle::new(date(2025, 12, 1), 5)];
    let pregnancy = Pregnancy::new(date(2025, 11, 16));
    let pregnancies = vec![pregnancy.clone()];

    relink_all(&mut cycles, &pregnancies, date(2026, 1, 10));

    assert_eq!(resolve(&cycles[0], &pregnancies), Some(&pregnancy));
    assert_eq!(resolve(&cycles[1], &pregnancies), None);
}

#[test]
fn test_relink_heals_after_pregnancy_removed() {
    let mut cycles = vec![Cycle::new(date(2025, 1, 1), 5)];
    let pregnancy = Pregnancy::new(date(2025, 1, 10));
    relink_all(&mut cycles, &[pregnancy], date(2025, 3, 1));
    assert!(cycles[0].is_pregnant());

    // pregnancy list no longer contains it
    assert_eq!(unlink_dangling(&mut cycles, &[]), 1);
    assert!(!cycles[0].is_pregnant());
}

proptest! {
    #[test]
    fn prop_relink_is_idempotent(
        cycle_offsets in prop::collection::btree_set(0i64..400, 0..8),
        pregnancy_offsets in prop::collection::btree_set(-30i64..430, 0..5),
        today_offset in 0i64..460,
    ) {
        let offsets: Vec<i64> = cycle_offsets.into_iter().collect();
        let mut cycles = cycles_at(&offsets);
        let pregnancies: Vec<Pregnancy> = pregnancy_offsets
            .into_iter()
            .map(|o| Pregnancy::new(base() + Duration::days(o)))
            .collect();
        let today = base() + Duration::days(today_offset);

        let first_count = relink_all(&mut cycles, &pregnancies, today);
        let once = links(&cycles);
        let second_count = relink_all(&mut cycles, &pregnancies, today);

        prop_assert_eq!(first_count, second_count);
        prop_assert_eq!(once, links(&cycles));
    }

    #[test]
    fn prop_bucket_follows_start_dates(
        d1 in 0i64..100,
        gap1 in 1i64..60,
        gap2 in 1i64..60,
        p in -50i64..300,
    ) {
        let d2 = d1 + gap1;
        let d3 = d2 + gap2;
        let cycles = cycles_at(&[d1, d2, d3]);
        let today = base() + Duration::days(d3 + 365);
        let pregnancy = Pregnancy::new(base() + Duration::days(p));

        let mut linked = cycles.clone();
        relink_all(&mut linked, &[pregnancy.clone()], today);

        let expected = if p < d2 {
            0
        } else if p < d3 {
            1
        } else {
            2
        };
        prop_assert_eq!(bucket_index(&cycles, pregnancy.start_date, today), Some(expected));
        prop_assert_eq!(linked[expected].pregnancy_id, Some(pregnancy.id));
        prop_assert_eq!(linked.iter().filter(|c| c.is_pregnant()).count(), 1);
    }
}
