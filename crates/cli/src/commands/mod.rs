pub mod aggregate;
pub mod config;
pub mod doctor;
pub mod evaluate;
pub mod lift;
pub mod recommend;

use chrono::NaiveDate;
use hotelpilot_core::config::{AppConfig, ConfigError, LoadOptions};
use hotelpilot_core::domain::signal::AirportSignal;
use hotelpilot_core::errors::{ApplicationError, DomainError, InterfaceError};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;
pub const EXIT_POLICY_CONFIG: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            user_message: None,
            correlation_id: None,
            result: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn with_result(
        command: &str,
        message: impl Into<String>,
        result: &impl Serialize,
    ) -> Self {
        let result = match serde_json::to_value(result) {
            Ok(result) => result,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            user_message: None,
            correlation_id: None,
            result: Some(result),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            user_message: None,
            correlation_id: None,
            result: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn config_failure(command: &str, error: &ConfigError) -> Self {
        let interface = ApplicationError::from(error).into_interface(new_correlation_id());
        Self::interface_failure(command, "config_validation", &interface, EXIT_CONFIG)
    }

    pub fn invalid_input(command: &str, message: impl Into<String>) -> Self {
        Self::failure(command, "invalid_input", message, EXIT_INVALID_INPUT)
    }

    pub fn domain_failure(command: &str, error: &DomainError) -> Self {
        Self::correlated_failure(command, error, new_correlation_id())
    }

    /// Domain failure reported under an existing correlation id, so the envelope
    /// matches the audit trail of the same request.
    pub fn correlated_failure(
        command: &str,
        error: &DomainError,
        correlation_id: impl Into<String>,
    ) -> Self {
        let exit_code = match error {
            DomainError::PolicyConfig(_) => EXIT_POLICY_CONFIG,
            DomainError::InvalidSignal(_) | DomainError::ZeroBaseline => EXIT_INVALID_INPUT,
        };
        let interface = ApplicationError::from(error.clone()).into_interface(correlation_id);
        Self::interface_failure(command, error.error_class(), &interface, exit_code)
    }

    fn interface_failure(
        command: &str,
        error_class: &str,
        error: &InterfaceError,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: error.to_string(),
            user_message: Some(error.user_message().to_string()),
            correlation_id: Some(error.correlation_id().to_string()),
            result: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub(crate) fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            concat!(
                "{{\"command\":\"unknown\",\"status\":\"error\",",
                "\"error_class\":\"serialization\",\"message\":\"{}\"}}"
            ),
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(
    command: &str,
    options: &LoadOptions,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| CommandResult::config_failure(command, &error))
}

pub(crate) fn parse_date(command: &str, raw: &str) -> Result<NaiveDate, CommandResult> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CommandResult::invalid_input(command, format!("`{raw}` is not a YYYY-MM-DD date"))
    })
}

/// One `CODE:CURRENT:BASELINE[:WEIGHT]` observation from the command line.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SignalArg {
    code: String,
    current_seats: u32,
    baseline_seats: u32,
    weight: Option<f64>,
}

impl SignalArg {
    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(format!("signal `{raw}` must look like CODE:CURRENT:BASELINE[:WEIGHT]"));
        }

        let current_seats = parts[1]
            .parse::<u32>()
            .map_err(|_| format!("signal `{raw}` has a non-numeric current seat count"))?;
        let baseline_seats = parts[2]
            .parse::<u32>()
            .map_err(|_| format!("signal `{raw}` has a non-numeric baseline seat count"))?;
        let weight = match parts.get(3) {
            Some(weight) => Some(
                weight
                    .parse::<f64>()
                    .map_err(|_| format!("signal `{raw}` has a non-numeric weight"))?,
            ),
            None => None,
        };

        Ok(Self { code: parts[0].to_string(), current_seats, baseline_seats, weight })
    }
}

/// Explicit weights win; otherwise weights come from the profile matching `location`
/// (or the configured property location).
pub(crate) fn resolve_signals(
    command: &str,
    raw_signals: &[String],
    location: Option<&str>,
    config: &AppConfig,
) -> Result<Vec<AirportSignal>, CommandResult> {
    let parsed = raw_signals
        .iter()
        .map(|raw| SignalArg::parse(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| CommandResult::invalid_input(command, message))?;

    let weighted = parsed.iter().filter(|arg| arg.weight.is_some()).count();
    if weighted == parsed.len() {
        return parsed
            .into_iter()
            .map(|arg| {
                AirportSignal::new(
                    &arg.code,
                    arg.current_seats,
                    arg.baseline_seats,
                    arg.weight.unwrap_or_default(),
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| CommandResult::domain_failure(command, &error));
    }
    if weighted > 0 {
        return Err(CommandResult::invalid_input(
            command,
            "either every signal carries an explicit weight or none does",
        ));
    }

    let location = location.or(config.property.location.as_deref()).unwrap_or_default();
    let profile = config
        .airports
        .resolve(location)
        .map_err(|error| CommandResult::domain_failure(command, &error))?;
    tracing::debug!(
        event_name = "cli.weight_profile_resolved",
        profile = %profile.name,
        location = %location,
        "airport weight profile resolved"
    );

    let observations = parsed
        .into_iter()
        .map(|arg| (arg.code, arg.current_seats, arg.baseline_seats))
        .collect::<Vec<_>>();
    profile.signals(&observations).map_err(|error| CommandResult::domain_failure(command, &error))
}
