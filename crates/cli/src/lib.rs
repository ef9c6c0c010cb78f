pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use hotelpilot_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

use commands::aggregate::AggregateArgs;
use commands::evaluate::EvaluateArgs;
use commands::lift::LiftArgs;
use commands::recommend::RecommendArgs;
use commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "hotelpilot",
    about = "HotelPilot demand lift pricing CLI",
    long_about = "Turn arrival-airport seat capacity, fare pressure and local events into a \
                  bounded nightly-rate recommendation.",
    after_help = "Examples:\n  \
        hotelpilot evaluate --signal DCA:8500:7500 --signal IAD:13000:12000 \
        --signal BWI:6000:6000 --location Arlington --date 2024-07-04\n  \
        hotelpilot lift --current 9600 --baseline 8700 --event-weight 0.3\n  \
        hotelpilot --weekend-cap 0.11 recommend --index 0.45 --weekend\n  \
        hotelpilot doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a hotelpilot.toml config file")]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: OverrideArgs,
    #[command(subcommand)]
    command: Command,
}

/// Flags that win over env and file values.
#[derive(Debug, Clone, Default, Args)]
pub struct OverrideArgs {
    #[arg(long, global = true, help = "Log level: trace, debug, info, warn or error")]
    pub log_level: Option<String>,
    #[arg(long, global = true, help = "Log format: compact, pretty or json")]
    pub log_format: Option<LogFormat>,
    #[arg(
        id = "property_override",
        long = "property",
        global = true,
        help = "Property identifier (property.id)"
    )]
    pub property_id: Option<String>,
    #[arg(long, global = true, help = "Property location (property.location)")]
    pub property_location: Option<String>,
    #[arg(long, global = true, allow_negative_numbers = true, help = "Single-call weekday cap")]
    pub weekday_cap: Option<f64>,
    #[arg(long, global = true, allow_negative_numbers = true, help = "Single-call weekend cap")]
    pub weekend_cap: Option<f64>,
    #[arg(long, global = true, allow_negative_numbers = true, help = "Rolling 7-day net cap")]
    pub weekly_cap: Option<f64>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(value: OverrideArgs) -> Self {
        Self {
            log_level: value.log_level,
            log_format: value.log_format,
            property_id: value.property_id,
            property_location: value.property_location,
            weekday_cap: value.weekday_cap,
            weekend_cap: value.weekend_cap,
            weekly_cap: value.weekly_cap,
        }
    }
}

impl Cli {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: false,
            overrides: self.overrides.clone().into(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Reduce per-airport seat observations to weighted capacity totals")]
    Aggregate(AggregateArgs),
    #[command(about = "Compute the demand lift index from weighted capacity and demand signals")]
    Lift(LiftArgs),
    #[command(about = "Map a demand lift index to a capped pricing recommendation")]
    Recommend(RecommendArgs),
    #[command(about = "Run aggregation, lift and pricing policy end to end with audit output")]
    Evaluate(EvaluateArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, weight profiles, event calendar and a pipeline dry run")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = execute(&cli, &options);
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub fn execute(cli: &Cli, options: &LoadOptions) -> CommandResult {
    match &cli.command {
        Command::Aggregate(args) => commands::aggregate::run(args, options),
        Command::Lift(args) => commands::lift::run(args, options),
        Command::Recommend(args) => commands::recommend::run(args, options),
        Command::Evaluate(args) => commands::evaluate::run(args, options),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(*json, options),
    }
}

/// Logs go to stderr; stdout carries the JSON command envelope.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use hotelpilot_core::config::LogFormat;

    use super::Cli;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_example_uses_weighted_baseline() {
        let help = Cli::command().get_after_help().map(ToString::to_string).unwrap_or_default();
        assert!(help.contains("--baseline 8700"));
        assert!(!help.contains("8850"));
    }

    #[test]
    fn global_flags_fill_config_overrides() {
        let cli = Cli::try_parse_from([
            "hotelpilot",
            "recommend",
            "--index",
            "0.45",
            "--weekday-cap",
            "0.09",
            "--log-format",
            "json",
            "--property",
            "prop_042",
        ])
        .expect("arguments should parse");

        let overrides = cli.load_options().overrides;
        assert_eq!(overrides.weekday_cap, Some(0.09));
        assert_eq!(overrides.log_format, Some(LogFormat::Json));
        assert_eq!(overrides.property_id.as_deref(), Some("prop_042"));
        assert_eq!(overrides.weekend_cap, None);
    }

    #[test]
    fn negative_numbers_parse_as_values() {
        for argv in [
            vec!["hotelpilot", "lift", "--current", "100", "--baseline", "-5"],
            vec![
                "hotelpilot",
                "lift",
                "--current",
                "1",
                "--baseline",
                "1",
                "--fare-pressure",
                "-0.2",
            ],
            vec!["hotelpilot", "recommend", "--index", "-0.1"],
            vec!["hotelpilot", "evaluate", "--signal", "DCA:1:1:1", "--event-weight", "-0.3"],
        ] {
            assert!(Cli::try_parse_from(argv.iter().copied()).is_ok(), "failed to parse {argv:?}");
        }
    }
}
