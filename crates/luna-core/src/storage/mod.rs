pub mod config;
pub mod database;
pub mod import;
pub mod legacy;
pub mod migrations;

pub use config::{Config, CycleConfig, UiConfig};
pub use database::Database;
pub use import::{import_legacy, ImportSummary};
pub use legacy::LegacyStore;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Cycle, Pregnancy};

/// Full contents of a store: every cycle and every pregnancy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub cycles: Vec<Cycle>,
    pub pregnancies: Vec<Pregnancy>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty() && self.pregnancies.is_empty()
    }
}

/// Load/save boundary used by the tracker.
///
/// `load` returns the whole store or, when the store is corrupt, an empty
/// snapshot; never a partial one. `save` replaces the whole store atomically.
pub trait Repository {
    fn load(&self) -> Result<Snapshot>;
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Returns the data directory, creating it if needed.
///
/// `LUNA_DATA_DIR` overrides the location. Otherwise `~/.config/luna/`, or
/// `~/.config/luna-dev/` when `LUNA_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("LUNA_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("LUNA_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("luna-dev")
            } else {
                base_dir.join("luna")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
