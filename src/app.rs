//! Application startup and utilities.
//!
//! This module contains exit codes, tracing setup, log file handling and
//! error hints that support the main entry point.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use netmon::config::{ConfigError, field};
use netmon::events::json_subscriber;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, unknown devices, etc.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - socket failure, unreadable table, etc.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    match error {
        ConfigError::MissingRequired { field: f, .. } if *f == field::CONFIG => {
            eprintln!("\nRun 'netmon init' to generate a configuration template.");
        }
        ConfigError::FileRead { .. } => {
            eprintln!("\nRun 'netmon init' to generate a configuration template.");
        }
        ConfigError::NoScopeEnabled => {
            eprintln!("\nExample: netmon --ping --arp gateway");
        }
        _ => {}
    }
}

/// Sets up the tracing subscriber for logging.
///
/// Without a log file, human-readable lines go to stdout. With one, any
/// existing file is moved aside first and flat JSON lines, one per event,
/// are written to a fresh file.
///
/// # Errors
///
/// Returns an error if the old log file cannot be renamed or the new one
/// cannot be created.
pub fn setup_tracing(verbose: bool, log_file: Option<&Path>) -> io::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(path) = log_file {
        let file = open_log_file(path, Utc::now())?;
        json_subscriber(Mutex::new(file), filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    Ok(())
}

/// Moves an existing log file aside and creates a new one.
fn open_log_file(path: &Path, now: DateTime<Utc>) -> io::Result<File> {
    if path.exists() {
        fs::rename(path, rotated_path(path, now))?;
    }
    File::create(path)
}

/// Returns `path` with an RFC 3339 timestamp appended to its file name.
fn rotated_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(stamp);
    path.with_file_name(name)
}
