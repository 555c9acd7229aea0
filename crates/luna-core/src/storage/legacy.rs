//! Gzip-compressed JSON store used by earlier releases.
//!
//! Two files live side by side: `cycles.json.gz` and `pregnancies.json.gz`,
//! each holding a JSON array. Writes take an exclusive lock on a sibling
//! `.lock` file, go to a `.tmp` file, and are renamed into place.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Repository, Snapshot};
use crate::error::{CoreError, Result};

pub const CYCLES_FILE: &str = "cycles.json.gz";
pub const PREGNANCIES_FILE: &str = "pregnancies.json.gz";

#[derive(Debug, Clone)]
pub struct LegacyStore {
    dir: PathBuf,
}

impl LegacyStore {
    /// Use `dir` as the store location, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether either legacy file is present.
    pub fn exists(&self) -> bool {
        self.dir.join(CYCLES_FILE).exists() || self.dir.join(PREGNANCIES_FILE).exists()
    }

    /// Read one array file. Missing files are empty; unreadable or
    /// non-array contents are logged and treated as empty.
    fn read_items<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        let path = self.dir.join(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to open legacy store");
                return Vec::new();
            }
        };

        let mut json = String::new();
        if let Err(e) = GzDecoder::new(BufReader::new(file)).read_to_string(&mut json) {
            tracing::error!(path = %path.display(), error = %e, "failed to decompress legacy store");
            return Vec::new();
        }

        let value: serde_json::Value = match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to parse legacy store");
                return Vec::new();
            }
        };
        if !value.is_array() {
            tracing::warn!(path = %path.display(), "unexpected JSON format in legacy store");
            return Vec::new();
        }

        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to decode legacy records");
            Vec::new()
        })
    }

    fn write_items<T: Serialize>(&self, name: &str, items: &[T]) -> Result<()> {
        let path = self.dir.join(name);
        let tmp_path = self.dir.join(format!("{name}.tmp"));
        let lock_path = self.dir.join(format!("{name}.lock"));

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write()?;

        let tmp = File::create(&tmp_path)?;
        let mut encoder = GzEncoder::new(tmp, Compression::default());
        serde_json::to_writer(&mut encoder, items)?;
        encoder.flush()?;
        let tmp = encoder.finish().map_err(|e| CoreError::Storage {
            path: tmp_path.clone(),
            message: e.to_string(),
        })?;
        tmp.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl Repository for LegacyStore {
    fn load(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            cycles: self.read_items(CYCLES_FILE),
            pregnancies: self.read_items(PREGNANCIES_FILE),
        })
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.write_items(CYCLES_FILE, &snapshot.cycles)?;
        self.write_items(PREGNANCIES_FILE, &snapshot.pregnancies)?;
        tracing::info!(dir = %self.dir.display(), "saved legacy store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cycle, Pregnancy};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write_raw(dir: &Path, name: &str, contents: &[u8]) {
        let mut encoder = GzEncoder::new(File::create(dir.join(name)).unwrap(), Compression::default());
        encoder.write_all(contents).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LegacyStore::open(dir.path()).unwrap();
        assert!(!store.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LegacyStore::open(dir.path()).unwrap();
        let mut cycle = Cycle::new(date(2025, 1, 1), 2);
        cycle.generate_days();
        cycle.days[0].mood = Some("happy".into());
        let snapshot = Snapshot {
            cycles: vec![cycle],
            pregnancies: vec![Pregnancy::new(date(2025, 1, 20))],
        };

        store.save(&snapshot).unwrap();

        assert!(store.exists());
        assert!(!dir.path().join("cycles.json.gz.tmp").exists());
        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn original_format_without_ids_loads() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(
            dir.path(),
            CYCLES_FILE,
            br#"[{"start_date": "2025-01-01", "duration": 1, "days": [{"date": "2025-01-01", "flow": "Light"}]}]"#,
        );
        let store = LegacyStore::open(dir.path()).unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.cycles.len(), 1);
        assert_eq!(snapshot.cycles[0].days[0].flow, Some(crate::model::Flow::Light));
    }

    #[test]
    fn corrupt_or_non_array_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path(), CYCLES_FILE, br#"{"start_date": "2025-01-01"}"#);
        fs::write(dir.path().join(PREGNANCIES_FILE), b"not gzip at all").unwrap();
        let store = LegacyStore::open(dir.path()).unwrap();

        assert!(store.load().unwrap().is_empty());
    }
}
