use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use hotelpilot_core::config::{
    AppConfig, ConfigOverrides, LoadOptions, CONFIG_FILE_NAME, NESTED_CONFIG_FILE,
};
use toml::Value;

use crate::commands::CommandResult;

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("config", &error),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let flags = override_flags(&options.overrides);
    let source = |key_path: &str, env_keys: &[&str]| {
        if let Some((_, flag)) = flags.iter().find(|(key, _)| *key == key_path) {
            return format!("flag ({flag})");
        }
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(render_line(
        "property.id",
        config.property.id.as_deref().unwrap_or("<unset>"),
        source("property.id", &["HOTELPILOT_PROPERTY_ID"]),
    ));
    lines.push(render_line(
        "property.location",
        config.property.location.as_deref().unwrap_or("<unset>"),
        source("property.location", &["HOTELPILOT_PROPERTY_LOCATION"]),
    ));

    let pricing = &config.pricing;
    for (key, value, env_key) in [
        ("pricing.maintain_below", pricing.maintain_below, None),
        ("pricing.moderate_below", pricing.moderate_below, None),
        ("pricing.cap_tier_at", pricing.cap_tier_at, None),
        ("pricing.weekday_cap", pricing.weekday_cap, Some("HOTELPILOT_PRICING_WEEKDAY_CAP")),
        ("pricing.weekend_cap", pricing.weekend_cap, Some("HOTELPILOT_PRICING_WEEKEND_CAP")),
        ("pricing.weekly_cap", pricing.weekly_cap, Some("HOTELPILOT_PRICING_WEEKLY_CAP")),
        (
            "pricing.auto_approve_confidence",
            pricing.auto_approve_confidence,
            Some("HOTELPILOT_PRICING_AUTO_APPROVE_CONFIDENCE"),
        ),
    ] {
        let env_keys: Vec<&str> = env_key.into_iter().collect();
        lines.push(render_line(key, &value.to_string(), source(key, &env_keys)));
    }
    for (key, range) in [
        ("pricing.moderate_range", pricing.moderate_range),
        ("pricing.strong_range", pricing.strong_range),
    ] {
        lines.push(render_line(key, &format!("[{}, {}]", range.low, range.high), source(key, &[])));
    }

    lines.push(render_line(
        "airports.default_profile",
        config.airports.default_profile.as_deref().unwrap_or("<unset>"),
        source("airports.default_profile", &["HOTELPILOT_AIRPORTS_DEFAULT_PROFILE"]),
    ));
    let profile_names =
        config.airports.profiles.iter().map(|profile| profile.name.as_str()).collect::<Vec<_>>();
    lines.push(render_line(
        "airports.profiles",
        &format!("[{}]", profile_names.join(", ")),
        source("airports.profiles", &[]),
    ));
    lines.push(render_line(
        "events",
        &format!("{} configured", config.events.len()),
        source("events", &[]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["HOTELPILOT_LOGGING_LEVEL", "HOTELPILOT_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["HOTELPILOT_LOGGING_FORMAT", "HOTELPILOT_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

/// Key paths set from command-line flags, paired with the flag name.
fn override_flags(overrides: &ConfigOverrides) -> Vec<(&'static str, &'static str)> {
    [
        ("property.id", "--property", overrides.property_id.is_some()),
        ("property.location", "--property-location", overrides.property_location.is_some()),
        ("pricing.weekday_cap", "--weekday-cap", overrides.weekday_cap.is_some()),
        ("pricing.weekend_cap", "--weekend-cap", overrides.weekend_cap.is_some()),
        ("pricing.weekly_cap", "--weekly-cap", overrides.weekly_cap.is_some()),
        ("logging.level", "--log-level", overrides.log_level.is_some()),
        ("logging.format", "--log-format", overrides.log_format.is_some()),
    ]
    .into_iter()
    .filter(|(_, _, set)| *set)
    .map(|(key, flag, _)| (key, flag))
    .collect()
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
