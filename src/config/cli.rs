//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::defaults;

/// netmon: device and network monitor
///
/// Probes devices with ICMP echo requests, watches the ARP and routing
/// tables for changes affecting them, polls device CGI endpoints and
/// receives syslog messages.
#[derive(Debug, Parser)]
#[command(name = "netmon")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable ICMP echo probing of devices
    #[arg(long)]
    pub ping: bool,

    /// Enable ARP table monitoring
    #[arg(long)]
    pub arp: bool,

    /// Enable routing table monitoring
    #[arg(long)]
    pub routing: bool,

    /// Enable scheduled calls to device CGI endpoints
    #[arg(long)]
    pub cgi: bool,

    /// Enable the UDP syslog receiver
    #[arg(long)]
    pub syslog: bool,

    /// Path to configuration file (default: ~/.netmon.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// File to write JSON log lines to ('-' for stdout)
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print what would be monitored and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Devices to monitor; every configured device if none are given
    #[arg(value_name = "DEVICE")]
    pub devices: Vec<String>,
}

/// Subcommands for netmon
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::INIT_OUTPUT)]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns true if at least one monitoring scope was requested.
    #[must_use]
    pub const fn any_scope(&self) -> bool {
        self.ping || self.arp || self.routing || self.cgi || self.syslog
    }
}
