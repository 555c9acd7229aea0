use std::path::Path;

use luna_core::{import_legacy, Database, LegacyStore};

use super::{print_json, CliResult};

pub fn run(dir: &Path) -> CliResult {
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()).into());
    }
    let legacy = LegacyStore::open(dir)?;
    if !legacy.exists() {
        return Err(format!("no legacy data found in {}", dir.display()).into());
    }

    let mut db = Database::open()?;
    let summary = import_legacy(&legacy, &mut db)?;
    print_json(&summary)
}
