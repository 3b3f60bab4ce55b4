//! CGI endpoints to poll.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::device::Device;

/// URL scheme of a CGI endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Port used when none is configured.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }

    /// Returns the scheme as it appears in a URL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User name and secret presented to digest challenges.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub user: String,
    /// Password or token
    pub token: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("token", &"****")
            .finish()
    }
}

/// One CGI endpoint on one device, with its polling schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiTarget {
    /// Device serving the endpoint
    pub device: Device,
    /// URL scheme
    pub scheme: Scheme,
    /// TCP port
    pub port: u16,
    /// Path below the root, without a leading slash
    pub path: String,
    /// Pause between calls
    pub interval: Duration,
    /// Deadline for one call, authentication round trip included
    pub timeout: Duration,
    /// Call once and stop
    pub once_only: bool,
    /// Digest credentials
    pub credentials: Credentials,
}

impl CgiTarget {
    /// Returns the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the path does not form a valid URL.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        let authority = SocketAddr::new(self.device.ip, self.port);
        Url::parse(&format!(
            "{}://{authority}/{}",
            self.scheme,
            self.path.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ip: &str, scheme: Scheme, port: u16, path: &str) -> CgiTarget {
        CgiTarget {
            device: Device::new("cam", ip.parse().unwrap()),
            scheme,
            port,
            path: path.to_string(),
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
            once_only: false,
            credentials: Credentials::new("admin", "admin"),
        }
    }

    #[test]
    fn url_joins_scheme_address_port_and_path() {
        let url = target("10.0.0.5", Scheme::Http, 80, "cgi-bin/status.cgi?x=1")
            .url()
            .unwrap();

        assert_eq!(url.as_str(), "http://10.0.0.5/cgi-bin/status.cgi?x=1");
    }

    #[test]
    fn url_brackets_ipv6_and_keeps_custom_port() {
        let url = target("fd00::5", Scheme::Https, 8443, "/status").url().unwrap();

        assert_eq!(url.as_str(), "https://[fd00::5]:8443/status");
    }

    #[test]
    fn default_ports_follow_scheme() {
        assert_eq!(Scheme::Http.default_port(), 80);
        assert_eq!(Scheme::Https.default_port(), 443);
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));

        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
