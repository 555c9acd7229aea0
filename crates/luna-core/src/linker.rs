//! Pregnancy-to-cycle linking.
//!
//! Each cycle owns the bucket `[cycle.start_date, next_cycle.start_date)`;
//! the latest cycle's bucket runs up to (but excluding) `today`. A pregnancy
//! links to the cycle whose bucket contains its start date. A pregnancy dated
//! before the first cycle is linked to the first cycle.
//!
//! Links are stored only as [`PregnancyId`]s on [`Cycle`]; both collections
//! stay independent and [`resolve`] looks the pregnancy up when needed.
//! Everything here is total: empty inputs are no-ops.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::model::{Cycle, Pregnancy, PregnancyId};

/// Sort cycles ascending by start date.
pub fn sort_cycles(cycles: &mut [Cycle]) {
    cycles.sort_by_key(|c| c.start_date);
}

/// Index of the cycle whose bucket contains `date`.
///
/// `cycles` must already be sorted ascending by start date.
pub fn bucket_index(cycles: &[Cycle], date: NaiveDate, today: NaiveDate) -> Option<usize> {
    let first = cycles.first()?;
    if date < first.start_date {
        return Some(0);
    }

    cycles.iter().enumerate().position(|(i, cycle)| {
        let end = cycles.get(i + 1).map_or(today, |next| next.start_date);
        cycle.start_date <= date && date < end
    })
}

/// Recompute every link from scratch.
///
/// Sorts `cycles`, clears all links, then assigns each pregnancy in order.
/// When two pregnancies land in the same bucket the later one wins.
/// Returns the number of cycles that end up linked.
pub fn relink_all(cycles: &mut [Cycle], pregnancies: &[Pregnancy], today: NaiveDate) -> usize {
    sort_cycles(cycles);
    for cycle in cycles.iter_mut() {
        cycle.pregnancy_id = None;
    }

    for pregnancy in pregnancies {
        assign(cycles, pregnancy, today);
    }

    let linked = cycles.iter().filter(|c| c.is_pregnant()).count();
    tracing::debug!(
        cycles = cycles.len(),
        pregnancies = pregnancies.len(),
        linked,
        "relinked all pregnancies"
    );
    linked
}

/// Link one newly added pregnancy without touching other cycles' links.
///
/// Returns the index (in the now sorted `cycles`) of the cycle it was linked
/// to, if any.
pub fn link_single(pregnancy: &Pregnancy, cycles: &mut [Cycle], today: NaiveDate) -> Option<usize> {
    sort_cycles(cycles);
    assign(cycles, pregnancy, today)
}

fn assign(cycles: &mut [Cycle], pregnancy: &Pregnancy, today: NaiveDate) -> Option<usize> {
    let Some(index) = bucket_index(cycles, pregnancy.start_date, today) else {
        tracing::debug!(
            pregnancy = %pregnancy.id,
            start = %pregnancy.start_date,
            "pregnancy falls in no bucket, left unlinked"
        );
        return None;
    };

    let cycle = &mut cycles[index];
    tracing::debug!(
        pregnancy = %pregnancy.id,
        start = %pregnancy.start_date,
        cycle = %cycle.start_date,
        "linking pregnancy to cycle"
    );
    cycle.pregnancy_id = Some(pregnancy.id);
    Some(index)
}

/// Look up the pregnancy a cycle points at. Dangling ids resolve to `None`.
pub fn resolve<'a>(cycle: &Cycle, pregnancies: &'a [Pregnancy]) -> Option<&'a Pregnancy> {
    let id = cycle.pregnancy_id?;
    pregnancies.iter().find(|p| p.id == id)
}

/// Clear links that point at no known pregnancy. Returns how many were cleared.
pub fn unlink_dangling(cycles: &mut [Cycle], pregnancies: &[Pregnancy]) -> usize {
    let known: HashSet<PregnancyId> = pregnancies.iter().map(|p| p.id).collect();
    let mut cleared = 0;
    for cycle in cycles.iter_mut() {
        if cycle.pregnancy_id.is_some_and(|id| !known.contains(&id)) {
            tracing::warn!(cycle = %cycle.start_date, "dropping link to missing pregnancy");
            cycle.pregnancy_id = None;
            cleared += 1;
        }
    }
    cleared
}
