pub mod config;
pub mod cycle;
pub mod import;
pub mod pregnancy;
pub mod stats;

use chrono::NaiveDate;
use luna_core::{Config, CoreError, Database, Tracker};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Clap value parser for `YYYY-MM-DD` dates.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

/// Open the tracker over the default database.
pub fn open_tracker() -> Result<Tracker, CoreError> {
    Tracker::open(Database::open()?)
}

pub fn load_config() -> Config {
    Config::load_or_default()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date(" 2025-02-28 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("28/02/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("").is_err());
    }
}
