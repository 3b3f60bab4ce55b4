//! Syslog reception over UDP.
//!
//! Each datagram is parsed as RFC 5424 or RFC 3164 ([`SyslogMessage`]) and
//! reported as one event by a [`SyslogListener`].

mod error;
mod listener;
mod message;

pub use error::SyslogError;
pub use listener::{MAX_DATAGRAM, SyslogListener};
pub use message::SyslogMessage;
