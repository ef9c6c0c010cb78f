use clap::Args;
use hotelpilot_core::config::LoadOptions;
use hotelpilot_core::demand::aggregate::{FlightSignalAggregator, SignalAggregator};
use serde::Serialize;

use crate::commands::{load_config, resolve_signals, CommandResult};

#[derive(Debug, Clone, Default, Args)]
pub struct AggregateArgs {
    #[arg(
        long = "signal",
        required = true,
        help = "Airport observation as CODE:CURRENT:BASELINE[:WEIGHT]; repeat per airport"
    )]
    pub signals: Vec<String>,
    #[arg(long, help = "Property location used to pick an airport weight profile")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
struct AggregateOutput {
    airports: Vec<String>,
    weighted_current: f64,
    weighted_baseline: f64,
}

pub fn run(args: &AggregateArgs, options: &LoadOptions) -> CommandResult {
    let config = match load_config("aggregate", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let signals =
        match resolve_signals("aggregate", &args.signals, args.location.as_deref(), &config) {
            Ok(signals) => signals,
            Err(result) => return result,
        };

    match FlightSignalAggregator.aggregate(&signals) {
        Ok(capacity) => CommandResult::with_result(
            "aggregate",
            format!("aggregated {} airport signals", signals.len()),
            &AggregateOutput {
                airports: signals.iter().map(|signal| signal.airport_code.to_string()).collect(),
                weighted_current: capacity.weighted_current,
                weighted_baseline: capacity.weighted_baseline,
            },
        ),
        Err(error) => CommandResult::domain_failure("aggregate", &error),
    }
}
