//! ARP table rows.
//!
//! Rows come from `arp -an`, which prints one neighbour per line in either
//! the BSD form
//!
//! ```text
//! ? (10.0.0.5) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]
//! ```
//!
//! or the Linux net-tools form
//!
//! ```text
//! ? (10.0.0.5) at aa:bb:cc:dd:ee:ff [ether] on eth0
//! ```
//!
//! Incomplete entries have no MAC address and are skipped.

use super::entry::TableEntry;
use crate::events::Module;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

/// Command that lists the ARP table.
pub const ARP_COMMAND: (&str, &[&str]) = ("arp", &["-an"]);

static ARP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\((?P<ip>[0-9.]+)\) at (?P<mac>[0-9a-fA-F]{1,2}(?::[0-9a-fA-F]{1,2}){5})(?: \[\w+\])? on (?P<iface>[\w.-]+)",
    )
    .expect("ARP line pattern is valid")
});

/// One address-resolution entry, keyed by IP address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    /// Neighbour IP address (identity key).
    pub ip: IpAddr,
    /// Resolved link-layer address, lowercase.
    pub mac: String,
    /// Interface the neighbour was learned on.
    pub iface: String,
}

impl ArpEntry {
    /// Creates a new ARP entry.
    #[must_use]
    pub fn new(ip: IpAddr, mac: impl Into<String>, iface: impl Into<String>) -> Self {
        Self {
            ip,
            mac: mac.into().to_ascii_lowercase(),
            iface: iface.into(),
        }
    }
}

impl TableEntry for ArpEntry {
    type Key = IpAddr;

    const MODULE: Module = Module::Arp;
    const ADDED: &'static str = "added arp entry";
    const REMOVED: &'static str = "removed arp entry";
    const CHANGED: &'static str = "changed arp entry";
    const NO_CHANGES: &'static str = "no changes in arp table";

    fn key(&self) -> &IpAddr {
        &self.ip
    }

    /// Only a MAC flap counts as a change; an interface move with the same
    /// MAC does not.
    fn same_state(&self, other: &Self) -> bool {
        self.mac == other.mac
    }

    fn parse(line: &str) -> Option<Self> {
        let caps = ARP_LINE.captures(line)?;
        let ip = caps["ip"].parse().ok()?;
        Some(Self::new(ip, &caps["mac"], &caps["iface"]))
    }

    fn device_ip(&self) -> Option<IpAddr> {
        Some(self.ip)
    }

    fn fields(&self, name: Option<&str>) -> Vec<(&'static str, String)> {
        vec![
            ("name", name.unwrap_or_default().to_string()),
            ("ip", self.ip.to_string()),
            ("mac", self.mac.clone()),
            ("iface", self.iface.clone()),
        ]
    }

    fn changed_fields(
        previous: &Self,
        current: &Self,
        name: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut fields = current.fields(name);
        fields.push(("previous_mac", previous.mac.clone()));
        fields.push(("previous_iface", previous.iface.clone()));
        fields
    }
}
