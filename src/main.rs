//! netmon: device and network monitor
//!
//! Entry point for the netmon binary.

use std::path::Path;
use std::process::ExitCode;

use netmon::config::{Cli, Command, ValidatedConfig, write_default_config};

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it only sequences the testable pieces.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Some(Command::Init { output }) = &cli.command {
        return write_template(output);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };

    if let Err(e) = setup_tracing(config.verbose, config.log_file.as_deref()) {
        eprintln!("Failed to open log file: {e}");
        return exit_code::CONFIG_ERROR;
    }
    tracing::info!("{config}");

    monitor(config)
}

/// Loads the configuration, printing the error and a hint on failure.
fn load_config(cli: &Cli) -> Result<ValidatedConfig, ExitCode> {
    ValidatedConfig::load(cli).map_err(|e| {
        eprintln!("Configuration error: {e}");
        print_config_hint(&e);
        exit_code::CONFIG_ERROR
    })
}

/// Writes the configuration template for `netmon init`.
fn write_template(output: &Path) -> ExitCode {
    if let Err(e) = write_default_config(output) {
        eprintln!("Error: {e}");
        return exit_code::CONFIG_ERROR;
    }
    println!("Configuration template written to: {}", output.display());
    exit_code::SUCCESS
}

/// Runs the monitors on a multi-threaded runtime until they stop.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn monitor(config: ValidatedConfig) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {e}");
            return exit_code::runtime_error();
        }
    };

    if let Err(e) = runtime.block_on(run::execute(config)) {
        tracing::error!("netmon stopped: {e}");
        return exit_code::runtime_error();
    }
    exit_code::SUCCESS
}
