//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Missing required field that must be provided by CLI or config file.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// No monitoring flag was given.
    #[error("No monitors enabled: use --ping, --arp, --routing, --cgi and/or --syslog")]
    NoScopeEnabled,

    /// Two devices share a name.
    #[error("Duplicate device name '{name}'")]
    DuplicateDevice {
        /// The repeated name
        name: String,
    },

    /// Two `[[keys]]` entries share an id.
    #[error("Duplicate key id '{id}'")]
    DuplicateKey {
        /// The repeated id
        id: String,
    },

    /// A `key_id` refers to a key that is not declared.
    #[error("Device '{device}': unknown key id '{id}'")]
    UnknownKey {
        /// The unknown id
        id: String,
        /// Device whose CGI settings refer to it
        device: String,
    },

    /// A device address does not parse.
    #[error("Device '{device}': invalid IP address '{value}': {source}")]
    InvalidDeviceIp {
        /// Device name
        device: String,
        /// The unparsable address
        value: String,
        /// Underlying parse error
        #[source]
        source: std::net::AddrParseError,
    },

    /// A device list refers to a name that is not declared.
    #[error("Unknown device '{name}' in {scope}")]
    UnknownDevice {
        /// The unknown name
        name: String,
        /// Where the reference was made
        scope: &'static str,
    },

    /// Invalid duration value (zero).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Well-known field names for `MissingRequired` errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The configuration file path.
    pub const CONFIG: &str = "config";
    /// A device name.
    pub const DEVICE_NAME: &str = "devices.name";
    /// A key id.
    pub const KEY_ID: &str = "keys.id";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }

    /// Creates an `InvalidDuration` error for a zero value.
    #[must_use]
    pub fn zero_duration(field: impl Into<String>) -> Self {
        Self::InvalidDuration {
            field: field.into(),
            reason: "must be greater than 0".to_string(),
        }
    }
}
