//! Routing table rows.
//!
//! Rows come from `netstat -rn`. Both the BSD layout
//!
//! ```text
//! Destination        Gateway            Flags           Netif Expire
//! default            10.0.0.1           UGScg             en0
//! 10.0.0.5           aa:bb:cc:dd:ee:ff  UHLWIi            en0   1182
//! ```
//!
//! and the Linux layout are understood:
//!
//! ```text
//! Destination     Gateway         Genmask         Flags   MSS Window  irtt Iface
//! 0.0.0.0         10.0.0.1        0.0.0.0         UG        0 0          0 eth0
//! 10.0.0.5        0.0.0.0         255.255.255.255 UH        0 0          0 eth0
//! ```
//!
//! The BSD expiry column is optional and counts seconds. Linux rows never
//! expire; their destination is `default` for the zero route, the bare
//! address for host routes and `address/prefix` otherwise.

use super::entry::TableEntry;
use crate::events::{LogEvent, Module};
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::LazyLock;
use std::time::Duration;

/// Command that lists the routing table.
pub const ROUTE_COMMAND: (&str, &[&str]) = ("netstat", &["-rn"]);

/// Routes expiring sooner than this are reported on every tick.
pub const EXPIRY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

static ROUTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<dst>[0-9.]+|default)\s+(?P<gw>\S+)\s+(?P<flags>\w+)\s+(?P<iface>[\w.-]+)(?:\s+(?P<exp>\d+))?",
    )
    .expect("route line pattern is valid")
});

static LINUX_ROUTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<dst>[0-9.]+)\s+(?P<gw>[0-9.]+)\s+(?P<mask>[0-9.]+)\s+(?P<flags>[A-Z!]+)\s+\d+\s+\d+\s+\d+\s+(?P<iface>\S+)\s*$",
    )
    .expect("linux route line pattern is valid")
});

/// One routing table entry, keyed by destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Destination (identity key): an address or `default`.
    pub dst: String,
    /// Gateway: an address, a link-layer address or `link#N`.
    pub gw: String,
    /// Route flags as printed.
    pub flags: String,
    /// Outgoing interface.
    pub iface: String,
    /// Remaining lifetime; zero when the route does not expire.
    pub exp: Duration,
}

impl RouteEntry {
    /// Creates a new route entry.
    #[must_use]
    pub fn new(
        dst: impl Into<String>,
        gw: impl Into<String>,
        flags: impl Into<String>,
        iface: impl Into<String>,
        exp: Duration,
    ) -> Self {
        Self {
            dst: dst.into(),
            gw: gw.into(),
            flags: flags.into(),
            iface: iface.into(),
            exp,
        }
    }

    /// Returns true if the route has a positive expiry below the threshold.
    #[must_use]
    pub fn expires_soon(&self) -> bool {
        !self.exp.is_zero() && self.exp < EXPIRY_WARNING_THRESHOLD
    }
}

/// Parses a Linux row, folding the genmask into the destination.
fn parse_linux(line: &str) -> Option<RouteEntry> {
    let caps = LINUX_ROUTE_LINE.captures(line)?;
    let addr: Ipv4Addr = caps["dst"].parse().ok()?;
    let mask: Ipv4Addr = caps["mask"].parse().ok()?;
    let prefix = u32::from(mask).count_ones();

    let dst = match prefix {
        0 if addr.is_unspecified() => "default".to_string(),
        32 => addr.to_string(),
        _ => format!("{addr}/{prefix}"),
    };
    Some(RouteEntry::new(
        dst,
        &caps["gw"],
        &caps["flags"],
        &caps["iface"],
        Duration::ZERO,
    ))
}

fn format_expiry(exp: Duration) -> String {
    format!("{}s", exp.as_secs())
}

impl TableEntry for RouteEntry {
    type Key = String;

    const MODULE: Module = Module::Route;
    const ADDED: &'static str = "added route table entry";
    const REMOVED: &'static str = "removed route table entry";
    const CHANGED: &'static str = "changed route table entry";
    const NO_CHANGES: &'static str = "no changes in route table";

    fn key(&self) -> &String {
        &self.dst
    }

    /// Expiry counts down between ticks and is not part of the tracked state.
    fn same_state(&self, other: &Self) -> bool {
        self.gw == other.gw && self.flags == other.flags && self.iface == other.iface
    }

    fn parse(line: &str) -> Option<Self> {
        if line.is_empty()
            || line.starts_with("Internet")
            || line.starts_with("Destination")
            || line.starts_with("Kernel")
        {
            return None;
        }
        if let Some(entry) = parse_linux(line) {
            return Some(entry);
        }
        let caps = ROUTE_LINE.captures(line)?;
        let exp = caps
            .name("exp")
            .and_then(|m| m.as_str().parse().ok())
            .map_or(Duration::ZERO, Duration::from_secs);
        Some(Self::new(
            &caps["dst"],
            &caps["gw"],
            &caps["flags"],
            &caps["iface"],
            exp,
        ))
    }

    fn device_ip(&self) -> Option<IpAddr> {
        self.dst.parse().ok()
    }

    fn fields(&self, _name: Option<&str>) -> Vec<(&'static str, String)> {
        vec![
            ("dst", self.dst.clone()),
            ("gw", self.gw.clone()),
            ("flags", self.flags.clone()),
            ("iface", self.iface.clone()),
            ("exp", format_expiry(self.exp)),
        ]
    }

    fn changed_fields(
        previous: &Self,
        current: &Self,
        name: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut fields = current.fields(name);
        fields.push(("previous_gw", previous.gw.clone()));
        fields.push(("previous_flags", previous.flags.clone()));
        fields.push(("previous_iface", previous.iface.clone()));
        fields.push(("previous_exp", format_expiry(previous.exp)));
        fields
    }

    fn notice(&self) -> Option<LogEvent> {
        self.expires_soon().then(|| {
            LogEvent::warn(Module::Route, "route expiring soon").with_fields(self.fields(None))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse {
        use super::*;

        #[test]
        fn host_route_with_expiry() {
            let entry = RouteEntry::parse("10.0.0.5           aa:bb:cc:dd:ee:ff  UHLWIi            en0   1182")
                .unwrap();

            assert_eq!(entry.dst, "10.0.0.5");
            assert_eq!(entry.gw, "aa:bb:cc:dd:ee:ff");
            assert_eq!(entry.flags, "UHLWIi");
            assert_eq!(entry.iface, "en0");
            assert_eq!(entry.exp, Duration::from_secs(1182));
        }

        #[test]
        fn default_route_without_expiry() {
            let entry = RouteEntry::parse("default            10.0.0.1           UGScg             en0")
                .unwrap();

            assert_eq!(entry.dst, "default");
            assert_eq!(entry.gw, "10.0.0.1");
            assert_eq!(entry.exp, Duration::ZERO);
            assert_eq!(entry.device_ip(), None);
        }

        #[test]
        fn headers_and_blank_lines_are_skipped() {
            assert!(RouteEntry::parse("").is_none());
            assert!(RouteEntry::parse("Internet:").is_none());
            assert!(RouteEntry::parse("Internet6:").is_none());
            assert!(RouteEntry::parse("Destination        Gateway            Flags           Netif Expire").is_none());
            assert!(RouteEntry::parse("Routing tables").is_none());
        }

        #[test]
        fn linux_host_route() {
            let entry =
                RouteEntry::parse("10.0.0.5  0.0.0.0  255.255.255.255 UH 0 0 0 eth0").unwrap();

            assert_eq!(entry.dst, "10.0.0.5");
            assert_eq!(entry.gw, "0.0.0.0");
            assert_eq!(entry.flags, "UH");
            assert_eq!(entry.iface, "eth0");
            assert_eq!(entry.exp, Duration::ZERO);
            assert_eq!(entry.device_ip(), Some("10.0.0.5".parse().unwrap()));
        }

        #[test]
        fn linux_default_and_network_routes() {
            let default =
                RouteEntry::parse("0.0.0.0         10.0.0.1        0.0.0.0         UG        0 0          0 eth0")
                    .unwrap();
            let network =
                RouteEntry::parse("10.0.0.0        0.0.0.0         255.255.255.0   U         0 0          0 eth0")
                    .unwrap();

            assert_eq!(default.dst, "default");
            assert_eq!(default.gw, "10.0.0.1");
            assert_eq!(network.dst, "10.0.0.0/24");
            assert_eq!(network.device_ip(), None);
        }

        #[test]
        fn linux_headers_are_skipped() {
            assert!(RouteEntry::parse("Kernel IP routing table").is_none());
            assert!(RouteEntry::parse("Destination     Gateway         Genmask         Flags   MSS Window  irtt Iface").is_none());
        }

        #[test]
        fn ipv6_rows_are_skipped() {
            assert!(RouteEntry::parse("fe80::%lo0/64      fe80::1%lo0        UcI               lo0").is_none());
        }
    }

    mod identity {
        use super::*;

        fn route(gw: &str, flags: &str, iface: &str, exp: u64) -> RouteEntry {
            RouteEntry::new("10.0.0.5", gw, flags, iface, Duration::from_secs(exp))
        }

        #[test]
        fn expiry_is_not_tracked() {
            assert!(route("10.0.0.1", "UH", "en0", 100).same_state(&route("10.0.0.1", "UH", "en0", 40)));
        }

        #[test]
        fn gateway_flags_and_interface_are_tracked() {
            let base = route("10.0.0.1", "UH", "en0", 0);
            assert!(!base.same_state(&route("10.0.0.2", "UH", "en0", 0)));
            assert!(!base.same_state(&route("10.0.0.1", "UGH", "en0", 0)));
            assert!(!base.same_state(&route("10.0.0.1", "UH", "en1", 0)));
        }
    }

    mod expiry {
        use super::*;

        fn with_exp(secs: u64) -> RouteEntry {
            RouteEntry::new("10.0.0.5", "10.0.0.1", "UH", "en0", Duration::from_secs(secs))
        }

        #[test]
        fn zero_never_expires() {
            assert!(!with_exp(0).expires_soon());
            assert!(with_exp(0).notice().is_none());
        }

        #[test]
        fn below_threshold_expires_soon() {
            let entry = with_exp(29);
            assert!(entry.expires_soon());

            let notice = entry.notice().unwrap();
            assert_eq!(notice.message, "route expiring soon");
            assert_eq!(notice.keys(), vec!["dst", "gw", "flags", "iface", "exp"]);
            assert_eq!(notice.field("exp"), Some("29s"));
        }

        #[test]
        fn threshold_itself_is_not_soon() {
            assert!(!with_exp(30).expires_soon());
        }
    }

    #[test]
    fn changed_fields_use_consistent_ordering() {
        let previous = RouteEntry::new("10.0.0.5", "10.0.0.1", "UH", "en0", Duration::from_secs(60));
        let current = RouteEntry::new("10.0.0.5", "10.0.0.2", "UGH", "en1", Duration::from_secs(50));
        let keys: Vec<_> = RouteEntry::changed_fields(&previous, &current, None)
            .into_iter()
            .map(|(k, _)| k)
            .collect();

        assert_eq!(
            keys,
            vec![
                "dst",
                "gw",
                "flags",
                "iface",
                "exp",
                "previous_gw",
                "previous_flags",
                "previous_iface",
                "previous_exp"
            ]
        );
    }
}
