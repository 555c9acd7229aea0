//! # Luna Core Library
//!
//! This library provides the core logic for Luna, a menstrual cycle and
//! pregnancy tracker. Every operation is available through the standalone
//! `luna-cli` binary; front ends are thin layers over the same library.
//!
//! ## Architecture
//!
//! - **Model**: cycles with per-day entries, and pregnancies with stable ids
//! - **Linker**: assigns each pregnancy to the cycle whose interval contains
//!   its start date
//! - **Stats**: cycle length statistics, next period and ovulation
//!   predictions, current phase
//! - **Storage**: SQLite persistence, the legacy gzip JSON store, and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Tracker`]: owns cycles and pregnancies, relinks and persists on change
//! - [`CycleStats`]: statistics and predictions over non-pregnant cycles
//! - [`Database`]: SQLite persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod linker;
pub mod model;
pub mod stats;
pub mod storage;
pub mod tracker;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use model::{Cycle, DayEntry, Flow, Pregnancy, PregnancyId, Trimester};
pub use stats::{CycleStats, Phase, StatsSummary};
pub use storage::{import_legacy, Config, Database, ImportSummary, LegacyStore, Repository, Snapshot};
pub use tracker::{CycleEdit, Tracker};
