//! Syslog message parsing (RFC 5424 and RFC 3164).

use std::sync::LazyLock;

use regex::Regex;

static RFC5424: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^<(?P<pri>\d{1,3})>1 (?P<ts>\S+) (?P<host>\S+) (?P<app>\S+) \S+ \S+ (?:-|(?:\[.*?\])+)(?: (?P<msg>.*))?$",
    )
    .expect("static regex is valid")
});

static RFC3164: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^<(?P<pri>\d{1,3})>(?P<ts>[A-Z][a-z]{2} [ \d]\d \d{2}:\d{2}:\d{2}) (?P<host>\S+) (?P<app>[^:\[\s]+)(?:\[[^\]]*\])?: ?(?P<msg>.*)$",
    )
    .expect("static regex is valid")
});

static BARE_PRI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^<(?P<pri>\d{1,3})>(?P<msg>.*)$").expect("static regex is valid"));

const FACILITIES: [&str; 24] = [
    "kern", "user", "mail", "daemon", "auth", "syslog", "lpr", "news", "uucp", "cron",
    "authpriv", "ftp", "ntp", "security", "console", "solaris-cron", "local0", "local1",
    "local2", "local3", "local4", "local5", "local6", "local7",
];

const SEVERITIES: [&str; 8] = [
    "emerg", "alert", "crit", "err", "warning", "notice", "info", "debug",
];

/// Priority assumed for messages without a valid `<PRI>` (user.notice).
const DEFAULT_PRI: u8 = 13;

/// Highest valid priority value (local7.debug).
const MAX_PRI: u8 = 191;

/// One received syslog message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogMessage {
    /// Facility code, 0-23
    pub facility: u8,
    /// Severity code, 0 (emerg) to 7 (debug)
    pub severity: u8,
    /// Sender's timestamp, as sent
    pub timestamp: Option<String>,
    /// Sender's hostname
    pub hostname: Option<String>,
    /// Application name or tag
    pub app: Option<String>,
    /// Free-form message text
    pub msg: String,
}

impl SyslogMessage {
    /// Parses a datagram.
    ///
    /// RFC 5424 is tried first, then the BSD format. A datagram matching
    /// neither keeps its priority, if valid, and its text as the message.
    /// Parsing never fails.
    #[must_use]
    pub fn parse(datagram: &[u8]) -> Self {
        let text = String::from_utf8_lossy(datagram);
        let text = text.trim_end_matches(['\n', '\r', '\0']);

        Self::structured(text)
            .or_else(|| Self::bsd(text))
            .or_else(|| Self::bare(text))
            .unwrap_or_else(|| Self::new(DEFAULT_PRI, None, None, None, text))
    }

    fn structured(text: &str) -> Option<Self> {
        let caps = RFC5424.captures(text)?;
        let pri = priority(&caps["pri"])?;
        let msg = caps.name("msg").map_or("", |m| m.as_str());
        Some(Self::new(
            pri,
            nil_value(&caps["ts"]),
            nil_value(&caps["host"]),
            nil_value(&caps["app"]),
            msg.trim_start_matches('\u{feff}'),
        ))
    }

    fn bsd(text: &str) -> Option<Self> {
        let caps = RFC3164.captures(text)?;
        let pri = priority(&caps["pri"])?;
        Some(Self::new(
            pri,
            Some(&caps["ts"]),
            Some(&caps["host"]),
            Some(&caps["app"]),
            &caps["msg"],
        ))
    }

    fn bare(text: &str) -> Option<Self> {
        let caps = BARE_PRI.captures(text)?;
        let pri = priority(&caps["pri"])?;
        Some(Self::new(pri, None, None, None, &caps["msg"]))
    }

    fn new(
        pri: u8,
        timestamp: Option<&str>,
        hostname: Option<&str>,
        app: Option<&str>,
        msg: &str,
    ) -> Self {
        Self {
            facility: pri >> 3,
            severity: pri & 0x07,
            timestamp: timestamp.map(str::to_string),
            hostname: hostname.map(str::to_string),
            app: app.map(str::to_string),
            msg: msg.to_string(),
        }
    }

    /// Facility keyword, e.g. `daemon` or `local3`.
    #[must_use]
    pub fn facility_name(&self) -> &'static str {
        FACILITIES.get(usize::from(self.facility)).copied().unwrap_or("unknown")
    }

    /// Severity keyword, e.g. `err` or `info`.
    #[must_use]
    pub fn severity_name(&self) -> &'static str {
        SEVERITIES[usize::from(self.severity & 0x07)]
    }

    /// Returns true for `warning` and more severe.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        self.severity <= 4
    }
}

fn priority(digits: &str) -> Option<u8> {
    digits.parse::<u8>().ok().filter(|pri| *pri <= MAX_PRI)
}

fn nil_value(value: &str) -> Option<&str> {
    (value != "-").then_some(value)
}
