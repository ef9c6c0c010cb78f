use std::process::ExitCode;

fn main() -> ExitCode {
    hotelpilot_cli::run()
}
