use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::demand::events::EventCalendar;
use crate::demand::policy::PricingPolicy;
use crate::demand::profiles::{WeightProfile, WeightProfiles};
use crate::domain::calendar::CalendarEvent;
use crate::domain::recommendation::PercentRange;
use crate::errors::ApplicationError;

pub const CONFIG_FILE_NAME: &str = "hotelpilot.toml";
pub const NESTED_CONFIG_FILE: &str = "config/hotelpilot.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub property: PropertyConfig,
    pub pricing: PricingPolicy,
    pub airports: WeightProfiles,
    pub events: Vec<CalendarEvent>,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyConfig {
    pub id: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub property_id: Option<String>,
    pub property_location: Option<String>,
    pub weekday_cap: Option<f64>,
    pub weekend_cap: Option<f64>,
    pub weekly_cap: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl From<&ConfigError> for ApplicationError {
    fn from(value: &ConfigError) -> Self {
        ApplicationError::Configuration(value.to_string())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            property: PropertyConfig::default(),
            pricing: PricingPolicy::default(),
            airports: WeightProfiles::default(),
            events: Vec::new(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn event_calendar(&self) -> Result<EventCalendar, ConfigError> {
        EventCalendar::new(self.events.clone())
            .map_err(|error| ConfigError::Validation(format!("events: {error}")))
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(property) = patch.property {
            if let Some(id) = property.id {
                self.property.id = Some(id);
            }
            if let Some(location) = property.location {
                self.property.location = Some(location);
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(maintain_below) = pricing.maintain_below {
                self.pricing.maintain_below = maintain_below;
            }
            if let Some(moderate_below) = pricing.moderate_below {
                self.pricing.moderate_below = moderate_below;
            }
            if let Some(cap_tier_at) = pricing.cap_tier_at {
                self.pricing.cap_tier_at = cap_tier_at;
            }
            if let Some([low, high]) = pricing.moderate_range {
                self.pricing.moderate_range = PercentRange::new(low, high);
            }
            if let Some([low, high]) = pricing.strong_range {
                self.pricing.strong_range = PercentRange::new(low, high);
            }
            if let Some(weekday_cap) = pricing.weekday_cap {
                self.pricing.weekday_cap = weekday_cap;
            }
            if let Some(weekend_cap) = pricing.weekend_cap {
                self.pricing.weekend_cap = weekend_cap;
            }
            if let Some(weekly_cap) = pricing.weekly_cap {
                self.pricing.weekly_cap = weekly_cap;
            }
            if let Some(auto_approve_confidence) = pricing.auto_approve_confidence {
                self.pricing.auto_approve_confidence = auto_approve_confidence;
            }
        }

        if let Some(airports) = patch.airports {
            if let Some(default_profile) = airports.default_profile {
                self.airports.default_profile = Some(default_profile);
            }
            if let Some(profiles) = airports.profiles {
                self.airports.profiles = profiles;
            }
        }

        if let Some(events) = patch.events {
            self.events = events;
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HOTELPILOT_PROPERTY_ID") {
            self.property.id = Some(value);
        }
        if let Some(value) = read_env("HOTELPILOT_PROPERTY_LOCATION") {
            self.property.location = Some(value);
        }

        if let Some(value) = read_env("HOTELPILOT_PRICING_WEEKDAY_CAP") {
            self.pricing.weekday_cap = parse_f64("HOTELPILOT_PRICING_WEEKDAY_CAP", &value)?;
        }
        if let Some(value) = read_env("HOTELPILOT_PRICING_WEEKEND_CAP") {
            self.pricing.weekend_cap = parse_f64("HOTELPILOT_PRICING_WEEKEND_CAP", &value)?;
        }
        if let Some(value) = read_env("HOTELPILOT_PRICING_WEEKLY_CAP") {
            self.pricing.weekly_cap = parse_f64("HOTELPILOT_PRICING_WEEKLY_CAP", &value)?;
        }
        if let Some(value) = read_env("HOTELPILOT_PRICING_AUTO_APPROVE_CONFIDENCE") {
            self.pricing.auto_approve_confidence =
                parse_f64("HOTELPILOT_PRICING_AUTO_APPROVE_CONFIDENCE", &value)?;
        }

        if let Some(value) = read_env("HOTELPILOT_AIRPORTS_DEFAULT_PROFILE") {
            self.airports.default_profile = Some(value);
        }

        let log_level =
            read_env("HOTELPILOT_LOGGING_LEVEL").or_else(|| read_env("HOTELPILOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HOTELPILOT_LOGGING_FORMAT").or_else(|| read_env("HOTELPILOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(property_id) = overrides.property_id {
            self.property.id = Some(property_id);
        }
        if let Some(property_location) = overrides.property_location {
            self.property.location = Some(property_location);
        }
        if let Some(weekday_cap) = overrides.weekday_cap {
            self.pricing.weekday_cap = weekday_cap;
        }
        if let Some(weekend_cap) = overrides.weekend_cap {
            self.pricing.weekend_cap = weekend_cap;
        }
        if let Some(weekly_cap) = overrides.weekly_cap {
            self.pricing.weekly_cap = weekly_cap;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_airports(&self.airports)?;
        self.event_calendar()?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingPolicy) -> Result<(), ConfigError> {
    pricing.validate().map_err(|error| ConfigError::Validation(format!("pricing: {error}")))
}

fn validate_airports(airports: &WeightProfiles) -> Result<(), ConfigError> {
    let mut names = std::collections::BTreeSet::new();
    for profile in &airports.profiles {
        if profile.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "airports.profiles entries must have a non-empty name".to_string(),
            ));
        }
        if !names.insert(profile.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "airports.profiles contains duplicate profile `{}`",
                profile.name
            )));
        }
    }

    airports.validate().map_err(|error| ConfigError::Validation(format!("airports: {error}")))
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    property: Option<PropertyPatch>,
    pricing: Option<PricingPatch>,
    airports: Option<AirportsPatch>,
    events: Option<Vec<CalendarEvent>>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertyPatch {
    id: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    maintain_below: Option<f64>,
    moderate_below: Option<f64>,
    cap_tier_at: Option<f64>,
    moderate_range: Option<[f64; 2]>,
    strong_range: Option<[f64; 2]>,
    weekday_cap: Option<f64>,
    weekend_cap: Option<f64>,
    weekly_cap: Option<f64>,
    auto_approve_confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct AirportsPatch {
    default_profile: Option<String>,
    profiles: Option<Vec<WeightProfile>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::recommendation::PercentRange;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const VARS: &[&str] = &[
        "HOTELPILOT_PROPERTY_ID",
        "HOTELPILOT_PROPERTY_LOCATION",
        "HOTELPILOT_PRICING_WEEKDAY_CAP",
        "HOTELPILOT_PRICING_WEEKEND_CAP",
        "HOTELPILOT_PRICING_WEEKLY_CAP",
        "HOTELPILOT_PRICING_AUTO_APPROVE_CONFIDENCE",
        "HOTELPILOT_AIRPORTS_DEFAULT_PROFILE",
        "HOTELPILOT_LOGGING_LEVEL",
        "HOTELPILOT_LOGGING_FORMAT",
        "HOTELPILOT_LOG_LEVEL",
        "HOTELPILOT_LOG_FORMAT",
        "TEST_HOTELPILOT_LOCATION",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<std::path::PathBuf, String> {
        let path = dir.path().join("hotelpilot.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_match_standard_rate_caps() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let config = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.weekday_cap == 0.10, "weekday cap defaults to 10%")?;
        ensure(config.pricing.weekend_cap == 0.12, "weekend cap defaults to 12%")?;
        ensure(config.pricing.weekly_cap == 0.18, "weekly cap defaults to 18%")?;
        ensure(config.airports.profiles.is_empty(), "no airport weights are built in")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logging by default")
    }

    #[test]
    fn file_load_supports_profiles_events_and_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("TEST_HOTELPILOT_LOCATION", "Arlington, VA");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[property]
id = "prop_001"
location = "${TEST_HOTELPILOT_LOCATION}"

[pricing]
moderate_range = [0.04, 0.07]
weekend_cap = 0.11

[airports]
default_profile = "regional"

[[airports.profiles]]
name = "inner"
locations = ["Arlington", "Alexandria"]
weights = { DCA = 0.6, IAD = 0.3, BWI = 0.1 }

[[airports.profiles]]
name = "regional"
weights = { DCA = 0.5, IAD = 0.4, BWI = 0.1 }

[[events]]
date = "2024-07-04"
name = "Independence Day"
kind = "federal_holiday"
weight = 0.4
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.property.location.as_deref() == Some("Arlington, VA"),
                "location should be interpolated from env",
            )?;
            ensure(
                config.pricing.moderate_range == PercentRange::new(0.04, 0.07),
                "moderate range should come from file",
            )?;
            ensure(config.pricing.weekend_cap == 0.11, "weekend cap should come from file")?;
            ensure(config.airports.profiles.len() == 2, "both profiles should load")?;
            ensure(config.events.len() == 1, "event should load")?;
            let resolved = config
                .airports
                .resolve("Alexandria, VA")
                .map_err(|err| err.to_string())?;
            ensure(resolved.name == "inner", "Alexandria should resolve to inner profile")
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HOTELPILOT_PRICING_WEEKDAY_CAP", "0.09");
        env::set_var("HOTELPILOT_PROPERTY_ID", "prop_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[property]
id = "prop_file"

[pricing]
weekday_cap = 0.08
weekend_cap = 0.11

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    weekend_cap: Some(0.10),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.pricing.weekday_cap == 0.09, "env weekday cap should beat file")?;
            ensure(config.pricing.weekend_cap == 0.10, "override weekend cap should win")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                config.property.id.as_deref() == Some("prop_env"),
                "env property id should beat file",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HOTELPILOT_LOG_LEVEL", "warn");
        env::set_var("HOTELPILOT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let config = AppConfig::load(LoadOptions {
                config_path: Some(dir.path().join("absent.toml")),
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should be set from alias")?;
            ensure(matches!(config.logging.format, LogFormat::Json), "json format from alias")
        })();

        clear_vars();
        result
    }

    #[test]
    fn validation_fails_fast_on_cap_above_weekly() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HOTELPILOT_PRICING_WEEKEND_CAP", "0.25");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let error = match AppConfig::load(LoadOptions {
                config_path: Some(dir.path().join("absent.toml")),
                ..LoadOptions::default()
            }) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message) if message.contains("weekend_cap")
                ),
                "validation failure should mention weekend_cap",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn invalid_env_number_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("HOTELPILOT_PRICING_WEEKLY_CAP", "eighteen");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "HOTELPILOT_PRICING_WEEKLY_CAP"
                ),
                "error should name the env key",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn unbalanced_profile_weights_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[[airports.profiles]]
name = "lopsided"
weights = { DCA = 0.6, IAD = 0.6 }
"#,
        )?;

        match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Ok(_) => Err("expected airports validation failure".to_string()),
            Err(error) => ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message) if message.contains("lopsided")
                ),
                "error should name the profile",
            ),
        }
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("nope.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing file should be reported with its path",
        )
    }
}
