use chrono::NaiveDate;
use clap::Subcommand;

use super::{load_config, open_tracker, parse_date, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Averages, ranges and predictions
    Summary {
        /// Evaluate as of this date instead of today
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Current cycle phase
    Phase {
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let tracker = open_tracker()?;
    let config = load_config();
    let stats = tracker.stats(&config);

    match action {
        StatsAction::Summary { today } => {
            let today = today.unwrap_or_else(|| tracker.today());
            print_json(&stats.summary(today))?;
        }
        StatsAction::Phase { today } => {
            let today = today.unwrap_or_else(|| tracker.today());
            let phase = stats.current_phase(today);
            print_json(&serde_json::json!({
                "date": today,
                "phase": phase,
                "label": phase.to_string(),
            }))?;
        }
    }
    Ok(())
}
