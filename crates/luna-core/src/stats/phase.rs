use serde::{Deserialize, Serialize};
use std::fmt;

/// Where today falls relative to the latest recorded cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No history, or today lies outside the expected window.
    Unknown,
    Menstruation,
    Follicular,
    Ovulation,
    Luteal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Unknown => "Unknown",
            Phase::Menstruation => "Menstruation",
            Phase::Follicular => "Follicular",
            Phase::Ovulation => "Ovulation",
            Phase::Luteal => "Luteal",
        })
    }
}
