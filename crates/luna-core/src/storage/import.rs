//! One-shot import from the legacy gzip store into SQLite.

use serde::{Deserialize, Serialize};

use super::{Database, LegacyStore, Repository};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported_cycles: usize,
    pub skipped_cycles: usize,
    pub imported_pregnancies: usize,
    pub skipped_pregnancies: usize,
}

/// Copy every legacy record into `db`, skipping cycles and pregnancies whose
/// start date (or pregnancy id) is already stored. Safe to run repeatedly.
pub fn import_legacy(legacy: &LegacyStore, db: &mut Database) -> Result<ImportSummary> {
    let snapshot = legacy.load()?;
    let mut summary = ImportSummary::default();

    for pregnancy in &snapshot.pregnancies {
        if db.insert_pregnancy_if_absent(pregnancy)? {
            summary.imported_pregnancies += 1;
        } else {
            summary.skipped_pregnancies += 1;
        }
    }

    for cycle in &snapshot.cycles {
        match db.insert_cycle_if_absent(cycle)? {
            Some(_) => summary.imported_cycles += 1,
            None => summary.skipped_cycles += 1,
        }
    }

    tracing::info!(
        from = %legacy.dir().display(),
        imported_cycles = summary.imported_cycles,
        skipped_cycles = summary.skipped_cycles,
        imported_pregnancies = summary.imported_pregnancies,
        skipped_pregnancies = summary.skipped_pregnancies,
        "imported legacy store"
    );
    Ok(summary)
}
