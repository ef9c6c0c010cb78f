use clap::Args;
use hotelpilot_core::config::{AppConfig, LoadOptions};
use hotelpilot_core::demand::lift::{DemandLiftIndexCalculator, LiftCalculator, LiftInput};
use hotelpilot_core::domain::lift::DemandLiftDisplay;
use serde::Serialize;

use crate::commands::{load_config, parse_date, CommandResult};

#[derive(Debug, Clone, Default, Args)]
pub struct LiftArgs {
    #[arg(long, allow_negative_numbers = true, help = "Weighted current seat capacity")]
    pub current: f64,
    #[arg(long, allow_negative_numbers = true, help = "Weighted baseline seat capacity")]
    pub baseline: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Measured fare pressure in [0, 1]; estimated from seats when omitted"
    )]
    pub fare_pressure: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Event weight in [0, 1]; overrides the configured event calendar"
    )]
    pub event_weight: Option<f64>,
    #[arg(long, help = "Stay date (YYYY-MM-DD) used to look up configured events")]
    pub date: Option<String>,
    #[arg(long, help = "Last date (YYYY-MM-DD) of the event window; defaults to --date")]
    pub until: Option<String>,
}

#[derive(Debug, Serialize)]
struct LiftOutput {
    #[serde(flatten)]
    display: DemandLiftDisplay,
    fare_pressure_estimated: bool,
}

pub fn run(args: &LiftArgs, options: &LoadOptions) -> CommandResult {
    let config = match load_config("lift", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let event_weight = match resolve_event_weight(
        "lift",
        &config,
        args.event_weight,
        args.date.as_deref(),
        args.until.as_deref(),
    ) {
        Ok(event_weight) => event_weight,
        Err(result) => return result,
    };

    let input = LiftInput::new(args.current, args.baseline)
        .with_fare_pressure(args.fare_pressure)
        .with_event_weight(event_weight);

    match DemandLiftIndexCalculator::default().compute(&input) {
        Ok(lift) => CommandResult::with_result(
            "lift",
            format!("demand lift index {}", lift.display().index),
            &LiftOutput {
                display: lift.display(),
                fare_pressure_estimated: lift.fare_pressure_estimated,
            },
        ),
        Err(error) => CommandResult::domain_failure("lift", &error),
    }
}

/// An explicit weight wins; otherwise the strongest configured event in the window.
pub(crate) fn resolve_event_weight(
    command: &str,
    config: &AppConfig,
    explicit: Option<f64>,
    date: Option<&str>,
    until: Option<&str>,
) -> Result<f64, CommandResult> {
    if let Some(weight) = explicit {
        return Ok(weight);
    }
    let Some(date) = date else {
        return Ok(0.0);
    };

    let from = parse_date(command, date)?;
    let calendar =
        config.event_calendar().map_err(|error| CommandResult::config_failure(command, &error))?;
    let Some(until) = until else {
        return Ok(calendar.impact_on(from).weight);
    };

    let to = parse_date(command, until)?;
    if to < from {
        return Err(CommandResult::invalid_input(command, "--until must not be before --date"));
    }
    Ok(calendar.impact_between(from, to).weight)
}
