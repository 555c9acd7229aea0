use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Bleeding intensity for a single day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Flow {
    #[serde(alias = "none")]
    None,
    #[serde(alias = "light")]
    Light,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "heavy")]
    Heavy,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::None => "None",
            Flow::Light => "Light",
            Flow::Medium => "Medium",
            Flow::Heavy => "Heavy",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Flow::None),
            "light" => Ok(Flow::Light),
            "medium" => Ok(Flow::Medium),
            "heavy" => Ok(Flow::Heavy),
            other => Err(ValidationError::InvalidValue {
                field: "flow".into(),
                message: format!("unknown flow '{other}' (expected none, light, medium or heavy)"),
            }),
        }
    }
}

/// One calendar day of symptom tracking inside a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    /// Basal body temperature in °C.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub flow: Option<Flow>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DayEntry {
    /// Blank entry for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            symptoms: Vec::new(),
            mood: None,
            temperature: None,
            flow: None,
            notes: None,
        }
    }

    /// True when nothing has been recorded for this day.
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
            && self.mood.is_none()
            && self.temperature.is_none()
            && self.flow.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn flow_accepts_any_case() {
        assert_eq!("Heavy".parse::<Flow>().unwrap(), Flow::Heavy);
        assert_eq!(" light ".parse::<Flow>().unwrap(), Flow::Light);
        assert!("spotting".parse::<Flow>().is_err());
    }

    #[test]
    fn flow_deserializes_lowercase_alias() {
        let flow: Flow = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(flow, Flow::Medium);
        assert_eq!(serde_json::to_string(&flow).unwrap(), "\"Medium\"");
    }

    #[test]
    fn to_json_has_every_field() {
        let day = DayEntry {
            date: date(2025, 1, 1),
            symptoms: vec!["cramps".into(), "headache".into()],
            mood: Some("happy".into()),
            temperature: Some(36.5),
            flow: Some(Flow::Light),
            notes: Some("Felt good today.".into()),
        };
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["date"], "2025-01-01");
        assert_eq!(json["symptoms"], serde_json::json!(["cramps", "headache"]));
        assert_eq!(json["mood"], "happy");
        assert_eq!(json["temperature"], 36.5);
        assert_eq!(json["flow"], "Light");
        assert_eq!(json["notes"], "Felt good today.");
    }

    #[test]
    fn minimal_json_fills_defaults() {
        let day: DayEntry = serde_json::from_str(r#"{"date": "2025-01-01"}"#).unwrap();
        assert_eq!(day.date, date(2025, 1, 1));
        assert!(day.is_empty());
    }
}
