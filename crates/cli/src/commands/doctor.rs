use std::sync::Arc;

use hotelpilot_core::audit::{AuditContext, InMemoryAuditSink};
use hotelpilot_core::config::{AppConfig, LoadOptions};
use hotelpilot_core::demand::{DemandPricingRequest, DemandRuntime, StandardDemandRuntime};
use hotelpilot_core::domain::recommendation::PricingAction;
use hotelpilot_core::domain::signal::AirportSignal;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, options: &LoadOptions) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                concat!(
                    "{{\"overall_status\":\"fail\",",
                    "\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}"
                ),
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_weight_profiles(&config));
            checks.push(check_event_calendar(&config));
            checks.push(check_pipeline_dry_run(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["weight_profiles", "event_calendar", "pipeline_dry_run"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_weight_profiles(config: &AppConfig) -> DoctorCheck {
    if config.airports.profiles.is_empty() {
        return DoctorCheck {
            name: "weight_profiles",
            status: CheckStatus::Fail,
            details: "no airport weight profiles configured; signals need explicit weights"
                .to_string(),
        };
    }

    let location = config.property.location.as_deref().unwrap_or_default();
    match config.airports.resolve(location) {
        Ok(profile) => DoctorCheck {
            name: "weight_profiles",
            status: CheckStatus::Pass,
            details: format!(
                "{} profiles configured; property resolves to `{}`",
                config.airports.profiles.len(),
                profile.name
            ),
        },
        Err(error) => DoctorCheck {
            name: "weight_profiles",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_event_calendar(config: &AppConfig) -> DoctorCheck {
    match config.event_calendar() {
        Ok(_) => DoctorCheck {
            name: "event_calendar",
            status: CheckStatus::Pass,
            details: format!("{} events configured", config.events.len()),
        },
        Err(error) => DoctorCheck {
            name: "event_calendar",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// Flat capacity with no events must come back as MAINTAIN under any valid policy.
fn check_pipeline_dry_run(config: &AppConfig) -> DoctorCheck {
    let runtime = match StandardDemandRuntime::with_policy(config.pricing) {
        Ok(runtime) => runtime.with_audit_sink(Arc::new(InMemoryAuditSink::default())),
        Err(error) => {
            return DoctorCheck {
                name: "pipeline_dry_run",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let result = AirportSignal::new("DCA", 7_500, 7_500, 1.0).and_then(|signal| {
        runtime.evaluate(
            &DemandPricingRequest::new(vec![signal]),
            &AuditContext::new(None, "doctor", "cli"),
        )
    });

    match result {
        Ok(evaluation) if evaluation.recommendation.action == PricingAction::Maintain => {
            DoctorCheck {
                name: "pipeline_dry_run",
                status: CheckStatus::Pass,
                details: "flat capacity evaluated to MAINTAIN".to_string(),
            }
        }
        Ok(evaluation) => DoctorCheck {
            name: "pipeline_dry_run",
            status: CheckStatus::Fail,
            details: format!(
                "flat capacity evaluated to {} instead of MAINTAIN",
                evaluation.recommendation.action
            ),
        },
        Err(error) => DoctorCheck {
            name: "pipeline_dry_run",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
