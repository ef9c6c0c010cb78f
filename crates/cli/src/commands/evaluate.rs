use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use hotelpilot_core::audit::AuditContext;
use hotelpilot_core::config::{AppConfig, LoadOptions};
use hotelpilot_core::demand::weekly::AppliedRateChange;
use hotelpilot_core::demand::{DemandPricingRequest, DemandRuntime, StandardDemandRuntime};
use hotelpilot_core::domain::calendar::DisruptionRisk;
use hotelpilot_core::domain::lift::DemandLiftDisplay;
use hotelpilot_core::domain::recommendation::PricingRecommendation;
use serde::Serialize;

use crate::commands::lift::resolve_event_weight;
use crate::commands::recommend::calendar_context;
use crate::commands::{
    load_config, new_correlation_id, parse_date, resolve_signals, CommandResult,
};

#[derive(Debug, Clone, Default, Args)]
pub struct EvaluateArgs {
    #[arg(long, help = "Read a JSON pricing request instead of building one from flags")]
    pub request: Option<PathBuf>,
    #[arg(
        long = "signal",
        required_unless_present = "request",
        help = "Airport observation as CODE:CURRENT:BASELINE[:WEIGHT]; repeat per airport"
    )]
    pub signals: Vec<String>,
    #[arg(long, help = "Property location used to pick an airport weight profile")]
    pub location: Option<String>,
    #[arg(long, help = "Property identifier recorded on audit events")]
    pub property_id: Option<String>,
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
    #[arg(long, help = "Stay date (YYYY-MM-DD); drives events, weekend, holiday and weekly cap")]
    pub date: Option<String>,
    #[arg(long, help = "Last date (YYYY-MM-DD) of the event window; defaults to --date")]
    pub until: Option<String>,
    #[arg(long, help = "Treat the stay date as a weekend night")]
    pub weekend: bool,
    #[arg(long, help = "Treat the stay date as a holiday")]
    pub holiday: bool,
    #[arg(long, help = "Operational disruption risk: low, medium or high")]
    pub disruption: Option<String>,
    #[arg(
        long = "applied",
        help = "Rate change already applied, as DATE:PERCENT (e.g. 2024-07-01:0.05)"
    )]
    pub applied: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EvaluationOutput {
    correlation_id: String,
    property_id: Option<String>,
    weighted_current: f64,
    weighted_baseline: f64,
    lift: DemandLiftDisplay,
    fare_pressure_estimated: bool,
    recommendation: PricingRecommendation,
}

pub fn run(args: &EvaluateArgs, options: &LoadOptions) -> CommandResult {
    let config = match load_config("evaluate", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let request = match &args.request {
        Some(path) => match load_request(path) {
            Ok(request) => request,
            Err(error) => return CommandResult::invalid_input("evaluate", format!("{error:#}")),
        },
        None => match build_request(args, &config) {
            Ok(request) => request,
            Err(result) => return result,
        },
    };

    let property_id = request.property_id.clone().or_else(|| config.property.id.clone());
    let context = AuditContext::new(property_id.clone(), new_correlation_id(), "cli");

    let runtime = match StandardDemandRuntime::with_policy(config.pricing) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::correlated_failure("evaluate", &error, context.correlation_id);
        }
    };

    match runtime.evaluate(&request, &context) {
        Ok(evaluation) => CommandResult::with_result(
            "evaluate",
            format!("recommended {}", evaluation.recommendation.action),
            &EvaluationOutput {
                correlation_id: context.correlation_id,
                property_id,
                weighted_current: evaluation.capacity.weighted_current,
                weighted_baseline: evaluation.capacity.weighted_baseline,
                lift: evaluation.lift.display(),
                fare_pressure_estimated: evaluation.lift.fare_pressure_estimated,
                recommendation: evaluation.recommendation,
            },
        ),
        Err(error) => CommandResult::correlated_failure("evaluate", &error, context.correlation_id),
    }
}

fn load_request(path: &Path) -> anyhow::Result<DemandPricingRequest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read request file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse request file `{}`", path.display()))
}

fn build_request(
    args: &EvaluateArgs,
    config: &AppConfig,
) -> Result<DemandPricingRequest, CommandResult> {
    let signals = resolve_signals("evaluate", &args.signals, args.location.as_deref(), config)?;
    let event_weight = resolve_event_weight(
        "evaluate",
        config,
        args.event_weight,
        args.date.as_deref(),
        args.until.as_deref(),
    )?;
    let calendar =
        calendar_context("evaluate", config, args.date.as_deref(), args.weekend, args.holiday)?;

    let disruption = match &args.disruption {
        Some(raw) => raw
            .parse::<DisruptionRisk>()
            .map_err(|message| CommandResult::invalid_input("evaluate", message))?,
        None => DisruptionRisk::Low,
    };

    let history = args
        .applied
        .iter()
        .map(|raw| parse_applied_change(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let as_of = args.date.as_deref().map(|date| parse_date("evaluate", date)).transpose()?;

    Ok(DemandPricingRequest {
        property_id: args.property_id.clone(),
        fare_pressure: args.fare_pressure,
        event_weight,
        calendar,
        disruption,
        history,
        as_of,
        ..DemandPricingRequest::new(signals)
    })
}

fn parse_applied_change(raw: &str) -> Result<AppliedRateChange, CommandResult> {
    let Some((date, percent)) = raw.rsplit_once(':') else {
        return Err(CommandResult::invalid_input(
            "evaluate",
            format!("applied change `{raw}` must look like DATE:PERCENT"),
        ));
    };
    let date = parse_date("evaluate", date)?;
    let percent = percent.trim().parse::<f64>().map_err(|_| {
        CommandResult::invalid_input(
            "evaluate",
            format!("applied change `{raw}` has a non-numeric percent"),
        )
    })?;
    Ok(AppliedRateChange { date, percent })
}
