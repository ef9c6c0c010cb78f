use clap::Args;
use hotelpilot_core::config::{AppConfig, LoadOptions};
use hotelpilot_core::demand::policy::{PricingPolicyEngine, PricingPolicyEvaluator};
use hotelpilot_core::domain::calendar::CalendarContext;

use crate::commands::{load_config, parse_date, CommandResult};

#[derive(Debug, Clone, Default, Args)]
pub struct RecommendArgs {
    #[arg(long, allow_negative_numbers = true, help = "Demand lift index in [0, 1]")]
    pub index: f64,
    #[arg(long, help = "Treat the stay date as a weekend night")]
    pub weekend: bool,
    #[arg(long, help = "Treat the stay date as a holiday")]
    pub holiday: bool,
    #[arg(long, help = "Stay date (YYYY-MM-DD); derives weekend and configured holidays")]
    pub date: Option<String>,
}

pub fn run(args: &RecommendArgs, options: &LoadOptions) -> CommandResult {
    let config = match load_config("recommend", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let calendar = match calendar_context(
        "recommend",
        &config,
        args.date.as_deref(),
        args.weekend,
        args.holiday,
    ) {
        Ok(calendar) => calendar,
        Err(result) => return result,
    };

    let engine = match PricingPolicyEngine::new(config.pricing) {
        Ok(engine) => engine,
        Err(error) => return CommandResult::domain_failure("recommend", &error),
    };

    match engine.recommend(args.index, calendar) {
        Ok(recommendation) => CommandResult::with_result(
            "recommend",
            format!("recommended {}", recommendation.action),
            &recommendation,
        ),
        Err(error) => CommandResult::domain_failure("recommend", &error),
    }
}

/// Flags are OR-ed with whatever the date and the event calendar imply.
pub(crate) fn calendar_context(
    command: &str,
    config: &AppConfig,
    date: Option<&str>,
    weekend: bool,
    holiday: bool,
) -> Result<CalendarContext, CommandResult> {
    let Some(date) = date else {
        return Ok(CalendarContext::new(weekend, holiday));
    };

    let date = parse_date(command, date)?;
    let events =
        config.event_calendar().map_err(|error| CommandResult::config_failure(command, &error))?;
    let derived = CalendarContext::for_date(date, events.is_holiday(date));
    Ok(CalendarContext::new(derived.is_weekend || weekend, derived.is_holiday || holiday))
}
