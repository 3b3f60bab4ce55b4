//! Structured monitoring events.
//!
//! Every observation the monitors make (a probe result, a table change) is
//! reported as a [`LogEvent`]: a module, a severity, a fixed message and an
//! ordered list of key/value fields. Events are handed to an [`EventSink`];
//! the production sink, [`TracingSink`], forwards them to `tracing`.

use std::fmt;
use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// The component that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// ICMP echo probing.
    Ping,
    /// ARP table monitoring.
    Arp,
    /// Routing table monitoring.
    Route,
    /// Device CGI endpoint polling.
    Cgi,
    /// Syslog message reception.
    Syslog,
}

impl Module {
    /// Returns the short module name used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Arp => "arp",
            Self::Route => "route",
            Self::Cgi => "cgi",
            Self::Syslog => "syslog",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Routine observation.
    Info,
    /// Something the operator should look at.
    Warning,
}

/// A single structured monitoring event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Producing module.
    pub module: Module,
    /// Event severity.
    pub severity: Severity,
    /// Fixed, human-readable message.
    pub message: &'static str,
    /// Key/value fields in emission order.
    pub fields: Vec<(&'static str, String)>,
}

impl LogEvent {
    /// Creates an info-level event with no fields.
    #[must_use]
    pub const fn info(module: Module, message: &'static str) -> Self {
        Self {
            module,
            severity: Severity::Info,
            message,
            fields: Vec::new(),
        }
    }

    /// Creates a warning-level event with no fields.
    #[must_use]
    pub const fn warn(module: Module, message: &'static str) -> Self {
        Self {
            module,
            severity: Severity::Warning,
            message,
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Appends several pre-rendered fields.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Returns the value of the first field with the given key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the field keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(k, _)| *k).collect()
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Destination for monitoring events.
pub trait EventSink: Send + Sync {
    /// Records one event.
    fn emit(&self, event: LogEvent);
}

/// Shared handle to an event sink.
pub type SharedSink = Arc<dyn EventSink>;

/// Field keys the tracing sink records as individual structured fields.
///
/// Fields with any other key are still recorded, rendered together as
/// `key=value` pairs in a single `extra` field.
pub const FIELD_KEYS: [&str; 27] = [
    "name",
    "peer",
    "dst",
    "id",
    "seq",
    "took",
    "timeout",
    "error",
    "ip",
    "mac",
    "iface",
    "gw",
    "flags",
    "exp",
    "previous_mac",
    "previous_iface",
    "previous_gw",
    "previous_flags",
    "previous_exp",
    "url",
    "status",
    "body",
    "facility",
    "severity",
    "hostname",
    "app",
    "msg",
];

impl LogEvent {
    /// Renders fields whose key is not in [`FIELD_KEYS`], if any.
    #[must_use]
    pub fn extra_fields(&self) -> Option<String> {
        let extra: Vec<String> = self
            .fields
            .iter()
            .filter(|(key, _)| !FIELD_KEYS.contains(key))
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        (!extra.is_empty()).then(|| extra.join(" "))
    }
}

/// Sink that writes events through `tracing`.
///
/// The event message becomes the tracing message and every field becomes
/// a field of its own, so JSON output carries `message`, `module` and each
/// key at the top level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Returns a shared handle to a tracing sink.
    #[must_use]
    pub fn shared() -> SharedSink {
        Arc::new(Self)
    }
}

macro_rules! record_event {
    ($level:expr, $event:expr) => {{
        let event = $event;
        let extra = event.extra_fields();
        tracing::event!(
            $level,
            module = event.module.as_str(),
            name = event.field("name"),
            peer = event.field("peer"),
            dst = event.field("dst"),
            id = event.field("id"),
            seq = event.field("seq"),
            took = event.field("took"),
            timeout = event.field("timeout"),
            error = event.field("error"),
            ip = event.field("ip"),
            mac = event.field("mac"),
            iface = event.field("iface"),
            gw = event.field("gw"),
            flags = event.field("flags"),
            exp = event.field("exp"),
            previous_mac = event.field("previous_mac"),
            previous_iface = event.field("previous_iface"),
            previous_gw = event.field("previous_gw"),
            previous_flags = event.field("previous_flags"),
            previous_exp = event.field("previous_exp"),
            url = event.field("url"),
            status = event.field("status"),
            body = event.field("body"),
            facility = event.field("facility"),
            severity = event.field("severity"),
            hostname = event.field("hostname"),
            app = event.field("app"),
            msg = event.field("msg"),
            extra = extra.as_deref(),
            "{}",
            event.message
        )
    }};
}

impl EventSink for TracingSink {
    fn emit(&self, event: LogEvent) {
        match event.severity {
            Severity::Info => record_event!(tracing::Level::INFO, &event),
            Severity::Warning => record_event!(tracing::Level::WARN, &event),
        }
    }
}

/// Builds a subscriber writing one flat JSON object per line.
///
/// Each line carries `timestamp`, `level`, `message` and every recorded
/// field as a top-level key.
pub fn json_subscriber<W>(writer: W, filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}
