//! Pregnancy commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use luna_core::{Pregnancy, PregnancyId, Trimester, ValidationError};
use serde::Serialize;

use super::{open_tracker, parse_date, print_json, CliResult};

#[derive(Subcommand)]
pub enum PregnancyAction {
    /// Mark the latest cycle as pregnant
    On {
        /// Start date of the latest cycle
        #[arg(value_parser = parse_date)]
        cycle: NaiveDate,
    },
    /// Clear the pregnancy on the latest cycle
    Off {
        #[arg(value_parser = parse_date)]
        cycle: NaiveDate,
    },
    /// List all pregnancies with the cycle each is linked to
    List,
    /// Record the end of a pregnancy
    End {
        id: PregnancyId,
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Mark a pregnancy as confirmed
    Confirm { id: PregnancyId },
    /// Delete a pregnancy
    Delete { id: PregnancyId },
    /// Due date, gestational age and trimester of the active pregnancy
    Status,
}

#[derive(Serialize)]
struct PregnancyView<'a> {
    #[serde(flatten)]
    pregnancy: &'a Pregnancy,
    cycle: Option<NaiveDate>,
    due_date: NaiveDate,
}

#[derive(Serialize)]
struct PregnancyStatus<'a> {
    pregnancy: &'a Pregnancy,
    due_date: NaiveDate,
    weeks: i64,
    days: i64,
    trimester: Trimester,
    summary: String,
}

pub fn run(action: PregnancyAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        PregnancyAction::On { cycle } => {
            let event = tracker.set_pregnancy(cycle, true)?;
            print_json(&event)?;
        }
        PregnancyAction::Off { cycle } => {
            let event = tracker.set_pregnancy(cycle, false)?;
            print_json(&event)?;
        }
        PregnancyAction::List => {
            let views: Vec<PregnancyView> = tracker
                .pregnancies()
                .iter()
                .map(|p| PregnancyView {
                    pregnancy: p,
                    cycle: tracker
                        .cycles()
                        .iter()
                        .find(|c| c.pregnancy_id == Some(p.id))
                        .map(|c| c.start_date),
                    due_date: p.due_date(),
                })
                .collect();
            print_json(&views)?;
        }
        PregnancyAction::End { id, date } => {
            let mut pregnancy = find(&tracker, id)?;
            pregnancy.end(date);
            print_json(&tracker.update_pregnancy(pregnancy)?)?;
        }
        PregnancyAction::Confirm { id } => {
            let mut pregnancy = find(&tracker, id)?;
            pregnancy.confirmed = true;
            print_json(&tracker.update_pregnancy(pregnancy)?)?;
        }
        PregnancyAction::Delete { id } => {
            let event = tracker.delete_pregnancy(id)?;
            print_json(&event)?;
        }
        PregnancyAction::Status => {
            let today = tracker.today();
            let status = tracker.active_pregnancy().map(|p| {
                let (weeks, days) = p.gestation(today);
                let trimester = p.trimester(today);
                PregnancyStatus {
                    pregnancy: p,
                    due_date: p.due_date(),
                    weeks,
                    days,
                    trimester,
                    summary: format!("{weeks} weeks, {days} days ({trimester})"),
                }
            });
            print_json(&status)?;
        }
    }
    Ok(())
}

fn find(tracker: &luna_core::Tracker, id: PregnancyId) -> Result<Pregnancy, ValidationError> {
    tracker
        .pregnancy(id)
        .cloned()
        .ok_or_else(|| ValidationError::PregnancyNotFound(id.to_string()))
}
