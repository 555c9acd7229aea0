use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Days from the start of a pregnancy to the default due date.
pub const GESTATION_DAYS: i64 = 280;

/// Stable pregnancy identifier, assigned once at creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PregnancyId(Uuid);

impl PregnancyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PregnancyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PregnancyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PregnancyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trimester {
    First,
    Second,
    Third,
}

impl fmt::Display for Trimester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trimester::First => "1st trimester",
            Trimester::Second => "2nd trimester",
            Trimester::Third => "3rd trimester",
        })
    }
}

/// A recorded pregnancy, independent of the cycle it ends up linked to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pregnancy {
    pub id: PregnancyId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub confirmed: bool,
    /// Set once the pregnancy has ended.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub custom_due_date: Option<NaiveDate>,
}

impl Pregnancy {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            id: PregnancyId::new(),
            start_date,
            confirmed: false,
            end_date: None,
            notes: None,
            custom_due_date: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn end(&mut self, date: NaiveDate) {
        self.end_date = Some(date);
    }

    pub fn due_date(&self) -> NaiveDate {
        self.custom_due_date
            .unwrap_or(self.start_date + Duration::days(GESTATION_DAYS))
    }

    /// Completed `(weeks, days)` since `start_date`.
    pub fn gestation(&self, today: NaiveDate) -> (i64, i64) {
        let elapsed = (today - self.start_date).num_days().max(0);
        (elapsed / 7, elapsed % 7)
    }

    pub fn trimester(&self, today: NaiveDate) -> Trimester {
        match self.gestation(today).0 {
            w if w < 13 => Trimester::First,
            w if w < 27 => Trimester::Second,
            _ => Trimester::Third,
        }
    }
}
