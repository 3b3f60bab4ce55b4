//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cgi::{CgiTarget, Credentials};
use crate::device::{Device, IcmpDevice};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::{DeviceSection, KeySection, TomlConfig};

/// ICMP probing plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpScope {
    /// Devices to probe with their resolved timing
    pub devices: Vec<IcmpDevice>,
}

/// ARP or routing table monitoring plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScope {
    /// Devices whose rows are reported
    pub devices: Vec<Device>,

    /// Sampling interval
    pub interval: Duration,
}

/// CGI polling plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiScope {
    /// Endpoints with resolved schedule and credentials
    pub targets: Vec<CgiTarget>,
}

/// Syslog receiver plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyslogScope {
    /// UDP address to listen on
    pub listen: SocketAddr,
}

/// Fully validated configuration ready for use by the application.
///
/// A scope is `Some` only when it was enabled on the command line.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and a parsed
/// TOML config, or [`ValidatedConfig::load`] to read the file as well.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Every declared device, in file order
    pub devices: Vec<Device>,

    /// ICMP probing, if enabled
    pub icmp: Option<IcmpScope>,

    /// ARP table monitoring, if enabled
    pub arp: Option<TableScope>,

    /// Routing table monitoring, if enabled
    pub routing: Option<TableScope>,

    /// CGI polling, if enabled
    pub cgi: Option<CgiScope>,

    /// Syslog reception, if enabled
    pub syslog: Option<SyslogScope>,

    /// JSON log file; `None` logs to stdout
    pub log_file: Option<PathBuf>,

    /// Dry-run mode (print the plan and exit)
    pub dry_run: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let log_str = self
            .log_file
            .as_ref()
            .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
        let icmp_str = self
            .icmp
            .as_ref()
            .map_or_else(|| "off".to_string(), |s| format!("{} devices", s.devices.len()));

        let cgi_str = self
            .cgi
            .as_ref()
            .map_or_else(|| "off".to_string(), |s| format!("{} endpoints", s.targets.len()));
        let syslog_str = self
            .syslog
            .map_or_else(|| "off".to_string(), |s| s.listen.to_string());

        write!(
            f,
            "Config {{ devices: {}, icmp: {}, arp: {}, routing: {}, cgi: {}, syslog: {}, log: {}, dry_run: {} }}",
            self.devices.len(),
            icmp_str,
            describe_table(self.arp.as_ref()),
            describe_table(self.routing.as_ref()),
            cgi_str,
            syslog_str,
            log_str,
            self.dry_run,
        )
    }
}

fn describe_table(scope: Option<&TableScope>) -> String {
    scope.map_or_else(
        || "off".to_string(),
        |s| format!("{} devices every {}s", s.devices.len(), s.interval.as_secs()),
    )
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and a TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No scope is enabled
    /// - Device names repeat or an address does not parse
    /// - A device list names an undeclared device
    /// - A duration is zero
    /// - Key ids repeat, or a CGI endpoint refers to an undeclared key
    pub fn from_raw(cli: &Cli, toml: &TomlConfig) -> Result<Self, ConfigError> {
        if !cli.any_scope() {
            return Err(ConfigError::NoScopeEnabled);
        }

        let devices = Self::build_devices(&toml.devices)?;
        let restrict = Self::resolve_restriction(cli, &devices)?;

        let icmp = if cli.ping {
            Some(Self::build_icmp(toml, &devices, &restrict)?)
        } else {
            None
        };

        let arp = if cli.arp {
            let section = toml.arp.as_ref();
            Some(Self::build_table(
                "arp",
                section.map(|s| s.devices.as_slice()),
                section.and_then(|s| s.interval),
                defaults::ARP_INTERVAL_SECS,
                &devices,
                &restrict,
            )?)
        } else {
            None
        };

        let routing = if cli.routing {
            let section = toml.routing.as_ref();
            Some(Self::build_table(
                "routing",
                section.map(|s| s.devices.as_slice()),
                section.and_then(|s| s.interval),
                defaults::ROUTING_INTERVAL_SECS,
                &devices,
                &restrict,
            )?)
        } else {
            None
        };

        let cgi = if cli.cgi {
            Some(Self::build_cgi(toml, &devices, &restrict)?)
        } else {
            None
        };

        let syslog = cli.syslog.then(|| SyslogScope {
            listen: toml
                .syslog
                .as_ref()
                .and_then(|s| s.listen)
                .unwrap_or_else(defaults::syslog_listen),
        });

        // Priority: CLI explicit > TOML; "-" means stdout
        let log_file = cli
            .log_file
            .clone()
            .or_else(|| toml.log.file.clone())
            .filter(|p| p.as_os_str() != defaults::STDOUT_LOG);

        Ok(Self {
            devices: devices.into_iter().map(|(device, _)| device).collect(),
            icmp,
            arp,
            routing,
            cgi,
            syslog,
            log_file,
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and the config file.
    ///
    /// The file is `cli.config` if set, otherwise `~/.netmon.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No config path can be determined
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let path = resolve_config_path(cli)?;
        let toml = TomlConfig::load(&path)?;
        Self::from_raw(cli, &toml)
    }

    /// Validates `[[devices]]`, keeping each device's ICMP overrides.
    fn build_devices(
        sections: &[DeviceSection],
    ) -> Result<Vec<(Device, &DeviceSection)>, ConfigError> {
        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(sections.len());

        for section in sections {
            let name = section.name.trim();
            if name.is_empty() {
                return Err(ConfigError::missing(
                    field::DEVICE_NAME,
                    "Every [[devices]] entry needs a name",
                ));
            }
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateDevice {
                    name: name.to_string(),
                });
            }

            let ip = section
                .ip
                .trim()
                .parse::<IpAddr>()
                .map_err(|source| ConfigError::InvalidDeviceIp {
                    device: name.to_string(),
                    value: section.ip.clone(),
                    source,
                })?;

            devices.push((Device::new(name, ip), section));
        }

        Ok(devices)
    }

    /// Validates positional device names; empty means no restriction.
    fn resolve_restriction(
        cli: &Cli,
        devices: &[(Device, &DeviceSection)],
    ) -> Result<HashSet<String>, ConfigError> {
        let mut restrict = HashSet::new();
        for name in &cli.devices {
            if !devices.iter().any(|(d, _)| d.name == *name) {
                return Err(ConfigError::UnknownDevice {
                    name: name.clone(),
                    scope: "command line",
                });
            }
            restrict.insert(name.clone());
        }
        Ok(restrict)
    }

    fn build_icmp(
        toml: &TomlConfig,
        devices: &[(Device, &DeviceSection)],
        restrict: &HashSet<String>,
    ) -> Result<IcmpScope, ConfigError> {
        let section = toml.icmp.as_ref();
        let selected = select_devices(
            "icmp",
            section.map(|s| s.devices.as_slice()),
            devices,
            restrict,
        )?;

        // Priority: device override > [icmp] section > default
        let section_interval = section.and_then(|s| s.interval);
        let section_timeout = section.and_then(|s| s.timeout);
        positive("icmp.interval", section_interval)?;
        positive("icmp.timeout", section_timeout)?;

        let mut targets = Vec::with_capacity(selected.len());
        for (device, overrides) in selected {
            let interval = positive(
                &format!("devices.{}.icmp.interval", device.name),
                overrides.icmp.interval,
            )?
            .or(section_interval)
            .unwrap_or(defaults::ICMP_INTERVAL_SECS);

            let timeout = positive(
                &format!("devices.{}.icmp.timeout", device.name),
                overrides.icmp.timeout,
            )?
            .or(section_timeout)
            .unwrap_or(defaults::ICMP_TIMEOUT_SECS);

            targets.push(IcmpDevice::new(
                device.clone(),
                Duration::from_secs(interval),
                Duration::from_secs(timeout),
            ));
        }

        Ok(IcmpScope { devices: targets })
    }

    fn build_cgi(
        toml: &TomlConfig,
        devices: &[(Device, &DeviceSection)],
        restrict: &HashSet<String>,
    ) -> Result<CgiScope, ConfigError> {
        let keys = build_keys(&toml.keys)?;
        let section = toml.cgi.as_ref();
        let selected = select_devices(
            "cgi",
            section.map(|s| s.devices.as_slice()),
            devices,
            restrict,
        )?;

        // Priority: endpoint > [cgi] section > default
        let section_interval = section.and_then(|s| s.interval);
        let section_timeout = section.and_then(|s| s.timeout);
        positive("cgi.interval", section_interval)?;
        positive("cgi.timeout", section_timeout)?;

        let mut targets = Vec::new();
        for (device, config) in selected {
            for endpoint in &config.cgi {
                let interval = positive(
                    &format!("devices.{}.cgi.interval", device.name),
                    endpoint.interval,
                )?
                .or(section_interval)
                .unwrap_or(defaults::CGI_INTERVAL_SECS);

                let timeout = positive(
                    &format!("devices.{}.cgi.timeout", device.name),
                    endpoint.timeout,
                )?
                .or(section_timeout)
                .unwrap_or(defaults::CGI_TIMEOUT_SECS);

                // Priority: endpoint key > device key > admin/admin
                let key_id = endpoint.key_id.as_deref().or(config.key_id.as_deref());
                let credentials = match key_id {
                    Some(id) => keys
                        .get(id)
                        .cloned()
                        .ok_or_else(|| ConfigError::UnknownKey {
                            id: id.to_string(),
                            device: device.name.clone(),
                        })?,
                    None => Credentials::new(defaults::CGI_USER, defaults::CGI_TOKEN),
                };

                let scheme = endpoint.scheme.unwrap_or_default();
                targets.push(CgiTarget {
                    device: device.clone(),
                    scheme,
                    port: endpoint.port.unwrap_or_else(|| scheme.default_port()),
                    path: endpoint.path.trim_start_matches('/').to_string(),
                    interval: Duration::from_secs(interval),
                    timeout: Duration::from_secs(timeout),
                    once_only: endpoint.once_only,
                    credentials,
                });
            }
        }

        Ok(CgiScope { targets })
    }

    fn build_table(
        scope: &'static str,
        names: Option<&[String]>,
        interval: Option<u64>,
        default_secs: u64,
        devices: &[(Device, &DeviceSection)],
        restrict: &HashSet<String>,
    ) -> Result<TableScope, ConfigError> {
        let selected = select_devices(scope, names, devices, restrict)?;
        let seconds = positive(&format!("{scope}.interval"), interval)?.unwrap_or(default_secs);

        Ok(TableScope {
            devices: selected.into_iter().map(|(d, _)| d.clone()).collect(),
            interval: Duration::from_secs(seconds),
        })
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Returns the config path: `--config`, else `~/.netmon.toml`.
///
/// # Errors
///
/// Returns an error if no path was given and the home directory is unknown.
pub fn resolve_config_path(cli: &Cli) -> Result<PathBuf, ConfigError> {
    if let Some(ref path) = cli.config {
        return Ok(path.clone());
    }

    dirs::home_dir()
        .map(|home| home.join(defaults::CONFIG_FILE_NAME))
        .ok_or_else(|| {
            ConfigError::missing(
                field::CONFIG,
                "No home directory found; pass --config explicitly",
            )
        })
}

// Helper functions

/// Resolves a scope's device list against the declared devices.
///
/// An absent or empty list, or `["all"]`, selects every device in
/// declaration order. Explicit lists keep their own order.
fn select_devices<'a, 'b>(
    scope: &'static str,
    names: Option<&[String]>,
    devices: &'a [(Device, &'b DeviceSection)],
    restrict: &HashSet<String>,
) -> Result<Vec<&'a (Device, &'b DeviceSection)>, ConfigError> {
    let names = names.unwrap_or_default();
    let everything = names.is_empty() || (names.len() == 1 && names[0] == defaults::ALL_DEVICES);

    let selected: Vec<_> = if everything {
        devices.iter().collect()
    } else {
        let mut picked: Vec<&(Device, &DeviceSection)> = Vec::with_capacity(names.len());
        for name in names {
            let entry = devices
                .iter()
                .find(|(d, _)| d.name == *name)
                .ok_or_else(|| ConfigError::UnknownDevice {
                    name: name.clone(),
                    scope,
                })?;
            if !picked.iter().any(|(d, _)| d.name == *name) {
                picked.push(entry);
            }
        }
        picked
    };

    Ok(selected
        .into_iter()
        .filter(|(d, _)| restrict.is_empty() || restrict.contains(&d.name))
        .collect())
}

/// Indexes `[[keys]]` by id.
fn build_keys(sections: &[KeySection]) -> Result<HashMap<&str, Credentials>, ConfigError> {
    let mut keys = HashMap::with_capacity(sections.len());
    for section in sections {
        let id = section.id.trim();
        if id.is_empty() {
            return Err(ConfigError::missing(
                field::KEY_ID,
                "Every [[keys]] entry needs an id",
            ));
        }
        let credentials = Credentials::new(section.user.as_str(), section.token.as_str());
        if keys.insert(id, credentials).is_some() {
            return Err(ConfigError::DuplicateKey { id: id.to_string() });
        }
    }
    Ok(keys)
}

/// Rejects an explicit zero; passes `None` through.
fn positive(field: &str, seconds: Option<u64>) -> Result<Option<u64>, ConfigError> {
    match seconds {
        Some(0) => Err(ConfigError::zero_duration(field)),
        other => Ok(other),
    }
}
