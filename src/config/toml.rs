//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;
use crate::cgi::Scheme;

/// Root configuration structure from TOML file.
///
/// Monitoring sections are optional; an absent section means "every
/// declared device, built-in defaults" when its scope is enabled.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Declared devices
    #[serde(default)]
    pub devices: Vec<DeviceSection>,

    /// ICMP probing options
    pub icmp: Option<IcmpSection>,

    /// ARP table monitoring options
    pub arp: Option<TableSection>,

    /// Routing table monitoring options
    pub routing: Option<TableSection>,

    /// CGI polling options
    pub cgi: Option<CgiSection>,

    /// Syslog receiver options
    pub syslog: Option<SyslogSection>,

    /// Digest credentials referred to by `key_id`
    #[serde(default)]
    pub keys: Vec<KeySection>,

    /// Logging options
    #[serde(default)]
    pub log: LogSection,
}

/// One `[[devices]]` entry.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSection {
    /// Unique device name
    pub name: String,

    /// IPv4 or IPv6 address
    pub ip: String,

    /// Default credentials for this device's CGI endpoints
    pub key_id: Option<String>,

    /// Per-device ICMP overrides
    #[serde(default)]
    pub icmp: DeviceIcmpSection,

    /// CGI endpoints served by this device
    #[serde(default)]
    pub cgi: Vec<DeviceCgiSection>,
}

/// Per-device `[devices.icmp]` overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceIcmpSection {
    /// Echo interval in seconds
    pub interval: Option<u64>,

    /// Echo timeout in seconds
    pub timeout: Option<u64>,
}

/// One `[[devices.cgi]]` endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceCgiSection {
    /// Path below the root, e.g. `cgi-bin/status.cgi?action=get`
    #[serde(default)]
    pub path: String,

    /// `http` (default) or `https`
    pub scheme: Option<Scheme>,

    /// TCP port; defaults to the scheme's port
    pub port: Option<u16>,

    /// Pause between calls in seconds
    pub interval: Option<u64>,

    /// Call deadline in seconds
    pub timeout: Option<u64>,

    /// Call once instead of on a schedule
    #[serde(default)]
    pub once_only: bool,

    /// Credentials for this endpoint; overrides the device's `key_id`
    pub key_id: Option<String>,
}

/// `[icmp]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IcmpSection {
    /// Device names to probe; empty or `["all"]` selects every device
    #[serde(default)]
    pub devices: Vec<String>,

    /// Echo interval in seconds
    pub interval: Option<u64>,

    /// Echo timeout in seconds
    pub timeout: Option<u64>,
}

/// `[arp]` and `[routing]` sections.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSection {
    /// Device names to watch; empty or `["all"]` selects every device
    #[serde(default)]
    pub devices: Vec<String>,

    /// Sampling interval in seconds
    pub interval: Option<u64>,
}

/// `[cgi]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CgiSection {
    /// Devices whose endpoints are polled; empty or `["all"]` selects every device
    #[serde(default)]
    pub devices: Vec<String>,

    /// Pause between calls in seconds
    pub interval: Option<u64>,

    /// Call deadline in seconds
    pub timeout: Option<u64>,
}

/// `[syslog]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyslogSection {
    /// UDP address to listen on
    pub listen: Option<SocketAddr>,
}

/// One `[[keys]]` entry.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySection {
    /// Id that `key_id` settings refer to
    pub id: String,

    /// User name
    pub user: String,

    /// Password or token
    pub token: String,
}

impl std::fmt::Debug for KeySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySection")
            .field("id", &self.id)
            .field("user", &self.user)
            .field("token", &"****")
            .finish()
    }
}

/// `[log]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// File to write JSON log lines to; `-` for stdout
    pub file: Option<PathBuf>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# netmon configuration file
#
# Monitors are enabled on the command line:
#   netmon --ping --arp --routing --cgi --syslog [DEVICE...]

# Devices to monitor. Names must be unique.
[[devices]]
name = "gateway"
ip = "192.168.1.1"

[[devices]]
name = "camera"
ip = "192.168.1.20"

# Credentials for this device's CGI endpoints (default: admin/admin)
# key_id = "camera"

# Per-device ICMP overrides (seconds)
# [devices.icmp]
# interval = 10
# timeout = 2

# CGI endpoints on this device, polled with --cgi
# [[devices.cgi]]
# path = "cgi-bin/status.cgi"
# scheme = "http"
# port = 80
# interval = 60
# timeout = 5
# once_only = false
# key_id = "camera"

[icmp]
# Devices to ping; empty or ["all"] selects every device
devices = ["all"]
# Seconds between echo requests (default: 5)
# interval = 5
# Seconds to wait for a reply (default: 5)
# timeout = 5

[arp]
devices = ["all"]
# Seconds between ARP table samples (default: 10)
# interval = 10

[routing]
devices = ["all"]
# Seconds between routing table samples (default: 10)
# interval = 10

[cgi]
devices = ["all"]
# Seconds between calls to one endpoint (default: 60)
# interval = 60
# Seconds allowed for one call (default: 5)
# timeout = 5

[syslog]
# UDP address to receive syslog on (default: 0.0.0.0:514)
# listen = "0.0.0.0:514"

# Digest credentials for CGI endpoints, referred to by key_id
# [[keys]]
# id = "camera"
# user = "admin"
# token = "secret"

[log]
# JSON log file; "-" or unset logs to stdout.
# An existing file is renamed with a timestamp suffix on startup.
# file = "netmon.log"
"#
    .to_string()
}
