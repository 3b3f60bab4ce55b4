//! Error types for the syslog listener.

use std::net::SocketAddr;
use thiserror::Error;

/// Error type for syslog reception.
///
/// Malformed messages never surface here; they are logged as text.
#[derive(Debug, Error)]
pub enum SyslogError {
    /// The listening socket could not be bound.
    #[error("Failed to bind syslog socket on {addr}: {source}")]
    Bind {
        /// Requested listen address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from the socket failed; the listener is lost.
    #[error("Syslog socket read failed: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
