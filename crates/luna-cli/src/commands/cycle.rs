//! Cycle management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use luna_core::{Cycle, CycleEdit, Flow, ValidationError};
use serde::Serialize;

use super::{load_config, open_tracker, parse_date, print_json, CliResult};

#[derive(Subcommand)]
pub enum CycleAction {
    /// Record a new period
    Add {
        /// First bleeding day (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
        /// Bleeding days (default: cycle.period_length from config)
        #[arg(long)]
        duration: Option<u32>,
    },
    /// List all cycles, oldest first
    List,
    /// Show one cycle with its days and linked pregnancy
    Show {
        /// Cycle start date
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
    },
    /// Move or resize a cycle
    Edit {
        /// Current cycle start date
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
        /// New start date
        #[arg(long = "start", value_parser = parse_date)]
        new_start: Option<NaiveDate>,
        /// New duration in days
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Delete a cycle and its days
    Delete {
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
    },
    /// Record data for one day of a cycle
    Day {
        /// Cycle start date
        #[arg(value_parser = parse_date)]
        cycle: NaiveDate,
        /// Day to update
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// none, light, medium or heavy
        #[arg(long)]
        flow: Option<Flow>,
        #[arg(long)]
        mood: Option<String>,
        /// Basal body temperature in °C
        #[arg(long)]
        temperature: Option<f64>,
        /// Comma-separated symptoms
        #[arg(long)]
        symptoms: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Serialize)]
struct CycleView<'a> {
    #[serde(flatten)]
    cycle: &'a Cycle,
    end_date: Option<NaiveDate>,
    pregnancy: Option<&'a luna_core::Pregnancy>,
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

pub fn run(action: CycleAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        CycleAction::Add { start, duration } => {
            let duration = duration.unwrap_or_else(|| load_config().cycle.period_length);
            let event = tracker.add_cycle(Cycle::new(start, duration))?;
            print_json(&event)?;
        }
        CycleAction::List => {
            print_json(tracker.cycles())?;
        }
        CycleAction::Show { start } => {
            let cycle = tracker
                .cycle(start)
                .ok_or(ValidationError::CycleNotFound(start))?;
            print_json(&CycleView {
                cycle,
                end_date: cycle.end_date(),
                pregnancy: tracker.pregnancy_for(cycle),
            })?;
        }
        CycleAction::Edit {
            start,
            new_start,
            duration,
        } => {
            let edit = CycleEdit {
                start_date: new_start,
                duration,
                days: Vec::new(),
            };
            let event = tracker.update_cycle(start, edit)?;
            print_json(&event)?;
        }
        CycleAction::Delete { start } => {
            let event = tracker.delete_cycle(start)?;
            print_json(&event)?;
        }
        CycleAction::Day {
            cycle,
            date,
            flow,
            mood,
            temperature,
            symptoms,
            notes,
        } => {
            let mut entry = tracker
                .cycle(cycle)
                .ok_or(ValidationError::CycleNotFound(cycle))?
                .day(date)
                .cloned()
                .ok_or_else(|| ValidationError::InvalidValue {
                    field: "date".into(),
                    message: format!("{date} is outside the cycle starting {cycle}"),
                })?;

            if let Some(flow) = flow {
                entry.flow = Some(flow);
            }
            if let Some(mood) = mood {
                entry.mood = non_empty(mood);
            }
            if let Some(temperature) = temperature {
                entry.temperature = Some(temperature);
            }
            if let Some(symptoms) = symptoms {
                entry.symptoms = symptoms
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            if let Some(notes) = notes {
                entry.notes = non_empty(notes);
            }

            tracing::debug!(cycle = %cycle, date = %date, "updating day entry");
            let event = tracker.set_day(cycle, entry)?;
            print_json(&event)?;
        }
    }
    Ok(())
}
