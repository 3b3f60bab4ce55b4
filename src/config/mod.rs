//! Configuration layer for netmon.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Scopes
//!
//! Monitoring scopes (ICMP, ARP, routing, CGI, syslog) are enabled only by
//! their CLI flags. The TOML file declares the devices and tunes each
//! scope; a section that is missing for an enabled scope selects every
//! device with built-in defaults.
//!
//! # Priority
//!
//! ICMP timing is resolved per device (highest to lowest):
//!
//! 1. **Device override** - `[devices.icmp]` of that device
//! 2. **Section value** - `[icmp]`
//! 3. **Built-in defaults** - 5s interval, 5s timeout
//!
//! CGI endpoints resolve interval and timeout the same way, from
//! `[[devices.cgi]]`, then `[cgi]`, then 60s and 5s. Their credentials come
//! from the endpoint's `key_id`, then the device's, then `admin`/`admin`.
//!
//! The log file from `--log-file` beats `[log] file`.
//!
//! Positional `DEVICE` arguments narrow every enabled scope to the named
//! devices; they never add devices a scope did not select.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{
    CgiSection, DeviceCgiSection, DeviceIcmpSection, DeviceSection, IcmpSection, KeySection,
    LogSection, SyslogSection, TableSection, TomlConfig, default_config_template,
};
pub use validated::{
    CgiScope, IcmpScope, SyslogScope, TableScope, ValidatedConfig, resolve_config_path,
    write_default_config,
};
