//! Monitored device identities.
//!
//! A [`Device`] is immutable once monitoring starts. Both the ICMP prober
//! and the table monitors refer to devices by name and address.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// IP address family of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    /// IPv4 (ICMP).
    V4,
    /// IPv6 (ICMPv6).
    V6,
}

impl IpFamily {
    /// Returns the family of the given address.
    #[must_use]
    pub const fn of(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Returns true if this is IPv6.
    #[must_use]
    pub const fn is_v6(self) -> bool {
        matches!(self, Self::V6)
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "ipv4"),
            Self::V6 => write!(f, "ipv6"),
        }
    }
}

/// A named network device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Operator-facing device name.
    pub name: String,
    /// Device address.
    pub ip: IpAddr,
}

impl Device {
    /// Creates a new device.
    #[must_use]
    pub fn new(name: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            name: name.into(),
            ip,
        }
    }

    /// Returns the address family of this device.
    #[must_use]
    pub const fn family(&self) -> IpFamily {
        IpFamily::of(self.ip)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.ip)
    }
}

/// A device together with its ICMP probing schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpDevice {
    /// The probed device.
    pub device: Device,
    /// Delay between the end of one probe and the start of the next.
    pub interval: Duration,
    /// How long to wait for an echo reply.
    pub timeout: Duration,
}

impl IcmpDevice {
    /// Creates a new ICMP probing target.
    #[must_use]
    pub const fn new(device: Device, interval: Duration, timeout: Duration) -> Self {
        Self {
            device,
            interval,
            timeout,
        }
    }
}

/// Lookup from address to device name for one monitored scope.
///
/// Table samplers use this both to drop rows for unmonitored hosts and to
/// label events with the device name.
#[derive(Debug, Clone, Default)]
pub struct DeviceIndex {
    by_ip: HashMap<IpAddr, String>,
}

impl DeviceIndex {
    /// Builds an index over the given devices.
    #[must_use]
    pub fn new<'a>(devices: impl IntoIterator<Item = &'a Device>) -> Self {
        Self {
            by_ip: devices
                .into_iter()
                .map(|d| (d.ip, d.name.clone()))
                .collect(),
        }
    }

    /// Returns true if the address belongs to a monitored device.
    #[must_use]
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.by_ip.contains_key(ip)
    }

    /// Returns the name of the device with the given address.
    #[must_use]
    pub fn name_of(&self, ip: &IpAddr) -> Option<&str> {
        self.by_ip.get(ip).map(String::as_str)
    }

    /// Returns the number of indexed devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_ip.len()
    }

    /// Returns true if no devices are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_ip.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, ip: &str) -> Device {
        Device::new(name, ip.parse().unwrap())
    }

    #[test]
    fn family_follows_address() {
        assert_eq!(device("a", "10.0.0.1").family(), IpFamily::V4);
        assert_eq!(device("b", "fe80::1").family(), IpFamily::V6);
        assert!(IpFamily::V6.is_v6());
        assert!(!IpFamily::V4.is_v6());
    }

    #[test]
    fn display_includes_name_and_address() {
        assert_eq!(device("cam", "10.0.0.5").to_string(), "cam[10.0.0.5]");
    }

    #[test]
    fn index_resolves_names() {
        let devices = [device("cam", "10.0.0.5"), device("nvr", "10.0.0.6")];
        let index = DeviceIndex::new(&devices);

        assert_eq!(index.len(), 2);
        assert!(index.contains(&"10.0.0.5".parse().unwrap()));
        assert_eq!(index.name_of(&"10.0.0.6".parse().unwrap()), Some("nvr"));
        assert_eq!(index.name_of(&"10.0.0.7".parse().unwrap()), None);
    }

    #[test]
    fn empty_index() {
        let index = DeviceIndex::default();
        assert!(index.is_empty());
        assert!(!index.contains(&"10.0.0.1".parse().unwrap()));
    }
}
