//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default interval between echo requests to one device, in seconds.
pub const ICMP_INTERVAL_SECS: u64 = 5;

/// Default time to wait for an echo reply, in seconds.
pub const ICMP_TIMEOUT_SECS: u64 = 5;

/// Default ARP table sampling interval in seconds.
pub const ARP_INTERVAL_SECS: u64 = 10;

/// Default routing table sampling interval in seconds.
pub const ROUTING_INTERVAL_SECS: u64 = 10;

/// Default pause between calls to one CGI endpoint, in seconds.
pub const CGI_INTERVAL_SECS: u64 = 60;

/// Default deadline for one CGI call, in seconds.
pub const CGI_TIMEOUT_SECS: u64 = 5;

/// User presented to digest challenges when no key is configured.
pub const CGI_USER: &str = "admin";

/// Secret presented to digest challenges when no key is configured.
pub const CGI_TOKEN: &str = "admin";

/// Default syslog UDP port.
pub const SYSLOG_PORT: u16 = 514;

/// Configuration file name looked up in the home directory.
pub const CONFIG_FILE_NAME: &str = ".netmon.toml";

/// Output path of `netmon init`.
pub const INIT_OUTPUT: &str = "netmon.toml";

/// Log file value meaning "standard output".
pub const STDOUT_LOG: &str = "-";

/// Device list value selecting every declared device.
pub const ALL_DEVICES: &str = "all";

/// Default echo interval as Duration.
#[must_use]
pub const fn icmp_interval() -> Duration {
    Duration::from_secs(ICMP_INTERVAL_SECS)
}

/// Default echo timeout as Duration.
#[must_use]
pub const fn icmp_timeout() -> Duration {
    Duration::from_secs(ICMP_TIMEOUT_SECS)
}

/// Default ARP interval as Duration.
#[must_use]
pub const fn arp_interval() -> Duration {
    Duration::from_secs(ARP_INTERVAL_SECS)
}

/// Default routing interval as Duration.
#[must_use]
pub const fn routing_interval() -> Duration {
    Duration::from_secs(ROUTING_INTERVAL_SECS)
}

/// Default syslog listen address: every IPv4 interface, port 514.
#[must_use]
pub const fn syslog_listen() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), SYSLOG_PORT)
}
