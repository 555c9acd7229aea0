//! SQLite-based storage for cycles, day entries and pregnancies.
//!
//! The tracker always writes the full snapshot in a single transaction, so a
//! crash mid-save leaves the previous contents intact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, Transaction};

use super::{data_dir, migrations, Repository, Snapshot};
use crate::error::{DatabaseError, Result};
use crate::model::{Cycle, DayEntry, Flow, Pregnancy, PregnancyId};

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_pregnancy_id(idx: usize, value: Option<String>) -> rusqlite::Result<Option<PregnancyId>> {
    value
        .map(|s| s.parse::<PregnancyId>().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn row_to_day_entry(row: &Row) -> rusqlite::Result<(i64, DayEntry)> {
    let flow = row
        .get::<_, Option<String>>(5)?
        .map(|s| s.parse::<Flow>().map_err(|e| conversion_error(5, e)))
        .transpose()?;
    let symptoms = match row.get::<_, Option<String>>(6)? {
        Some(json) if !json.is_empty() => {
            serde_json::from_str(&json).map_err(|e| conversion_error(6, e))?
        }
        _ => Vec::new(),
    };

    Ok((
        row.get(0)?,
        DayEntry {
            date: row.get(1)?,
            mood: row.get(2)?,
            temperature: row.get(3)?,
            notes: row.get(4)?,
            flow,
            symptoms,
        },
    ))
}

fn row_to_pregnancy(row: &Row) -> rusqlite::Result<Pregnancy> {
    let id: String = row.get(0)?;
    Ok(Pregnancy {
        id: id.parse().map_err(|e| conversion_error(0, e))?,
        start_date: row.get(1)?,
        confirmed: row.get(2)?,
        end_date: row.get(3)?,
        notes: row.get(4)?,
        custom_due_date: row.get(5)?,
    })
}

/// SQLite database for cycle storage.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/luna.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("luna.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self {
            conn,
            path: Some(path),
        };
        db.configure()?;
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn, path: None };
        db.configure()?;
        db.migrate()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(&self) -> Result<(), DatabaseError> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cycles (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                start_date   TEXT UNIQUE NOT NULL,
                duration     INTEGER NOT NULL,
                pregnancy_id TEXT
            );

            CREATE TABLE IF NOT EXISTS day_entries (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id    INTEGER NOT NULL,
                date        TEXT NOT NULL,
                mood        TEXT,
                temperature REAL,
                flow        TEXT,
                notes       TEXT,
                symptoms    TEXT,
                FOREIGN KEY (cycle_id) REFERENCES cycles(id) ON DELETE CASCADE,
                UNIQUE (cycle_id, date)
            );

            CREATE TABLE IF NOT EXISTS pregnancies (
                id              TEXT PRIMARY KEY,
                start_date      TEXT UNIQUE NOT NULL,
                confirmed       INTEGER NOT NULL,
                end_date        TEXT,
                notes           TEXT,
                custom_due_date TEXT
            );",
        )?;

        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    fn read_snapshot(&self) -> rusqlite::Result<Snapshot> {
        let mut days: HashMap<i64, Vec<DayEntry>> = HashMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT cycle_id, date, mood, temperature, notes, flow, symptoms
             FROM day_entries
             ORDER BY cycle_id, date",
        )?;
        for entry in stmt.query_map([], row_to_day_entry)? {
            let (cycle_id, day) = entry?;
            days.entry(cycle_id).or_default().push(day);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, start_date, duration, pregnancy_id FROM cycles ORDER BY start_date",
        )?;
        let cycles = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                Ok(Cycle {
                    id: Some(id),
                    start_date: row.get(1)?,
                    duration: row.get(2)?,
                    days: days.remove(&id).unwrap_or_default(),
                    pregnancy_id: parse_pregnancy_id(3, row.get(3)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, start_date, confirmed, end_date, notes, custom_due_date
             FROM pregnancies
             ORDER BY start_date",
        )?;
        let pregnancies = stmt
            .query_map([], row_to_pregnancy)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Snapshot {
            cycles,
            pregnancies,
        })
    }

    /// Insert a cycle and its days unless one with the same start date
    /// exists. Returns the new row id, or `None` when skipped.
    pub fn insert_cycle_if_absent(&mut self, cycle: &Cycle) -> Result<Option<i64>> {
        let tx = self.conn.transaction()?;
        let inserted = insert_cycle(&tx, cycle, true)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Insert a pregnancy unless its id or start date is already stored.
    /// Returns whether a row was written.
    pub fn insert_pregnancy_if_absent(&mut self, pregnancy: &Pregnancy) -> Result<bool> {
        let written = insert_pregnancy(&self.conn, pregnancy, true)?;
        Ok(written)
    }

    /// Start date of every stored cycle, ascending.
    pub fn cycle_start_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT start_date FROM cycles ORDER BY start_date")?;
        let dates = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<NaiveDate>>>()?;
        Ok(dates)
    }
}

fn insert_cycle(tx: &Transaction, cycle: &Cycle, or_ignore: bool) -> rusqlite::Result<Option<i64>> {
    let verb = if or_ignore { "INSERT OR IGNORE" } else { "INSERT" };
    let pregnancy_id = cycle.pregnancy_id.map(|id| id.to_string());
    let changed = match cycle.id.filter(|_| !or_ignore) {
        Some(id) => tx.execute(
            &format!("{verb} INTO cycles (id, start_date, duration, pregnancy_id) VALUES (?1, ?2, ?3, ?4)"),
            params![id, cycle.start_date, cycle.duration, pregnancy_id],
        )?,
        None => tx.execute(
            &format!("{verb} INTO cycles (start_date, duration, pregnancy_id) VALUES (?1, ?2, ?3)"),
            params![cycle.start_date, cycle.duration, pregnancy_id],
        )?,
    };
    if changed == 0 {
        return Ok(None);
    }

    let cycle_id = tx.last_insert_rowid();
    let mut stmt = tx.prepare_cached(
        "INSERT OR IGNORE INTO day_entries (cycle_id, date, mood, temperature, flow, notes, symptoms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for day in &cycle.days {
        let symptoms = serde_json::to_string(&day.symptoms)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        stmt.execute(params![
            cycle_id,
            day.date,
            day.mood,
            day.temperature,
            day.flow.map(|f| f.as_str()),
            day.notes,
            symptoms,
        ])?;
    }
    Ok(Some(cycle_id))
}

fn insert_pregnancy(conn: &Connection, pregnancy: &Pregnancy, or_ignore: bool) -> rusqlite::Result<bool> {
    let verb = if or_ignore { "INSERT OR IGNORE" } else { "INSERT" };
    let changed = conn.execute(
        &format!(
            "{verb} INTO pregnancies (id, start_date, confirmed, end_date, notes, custom_due_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
        params![
            pregnancy.id.to_string(),
            pregnancy.start_date,
            pregnancy.confirmed,
            pregnancy.end_date,
            pregnancy.notes,
            pregnancy.custom_due_date,
        ],
    )?;
    Ok(changed > 0)
}

impl Repository for Database {
    fn load(&self) -> Result<Snapshot> {
        match self.read_snapshot() {
            Ok(snapshot) => Ok(snapshot),
            Err(e @ rusqlite::Error::FromSqlConversionFailure(..))
            | Err(e @ rusqlite::Error::InvalidColumnType(..))
            | Err(e @ rusqlite::Error::IntegralValueOutOfRange(..)) => {
                tracing::error!(error = %e, "database contains undecodable rows, treating as empty");
                Ok(Snapshot::default())
            }
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM day_entries;
             DELETE FROM cycles;
             DELETE FROM pregnancies;",
        )?;
        for pregnancy in &snapshot.pregnancies {
            insert_pregnancy(&tx, pregnancy, false)?;
        }
        for cycle in &snapshot.cycles {
            insert_cycle(&tx, cycle, false)?;
        }
        tx.commit()?;
        tracing::info!(
            cycles = snapshot.cycles.len(),
            pregnancies = snapshot.pregnancies.len(),
            "saved snapshot"
        );
        Ok(())
    }
}
