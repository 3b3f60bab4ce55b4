//! Error types for the ICMP layer.

use crate::device::IpFamily;
use thiserror::Error;

/// Error type for ICMP monitoring.
///
/// Per-probe problems (a failed send, a timeout, an unmatched reply) are
/// reported as events and never surface here. These variants are fatal.
#[derive(Debug, Error)]
pub enum IcmpError {
    /// The shared socket for a family could not be created.
    #[error("Failed to open {family} ICMP socket: {source}")]
    Open {
        /// Address family of the socket.
        family: IpFamily,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from the shared socket failed; the socket is lost.
    #[error("{family} ICMP socket read failed: {source}")]
    Read {
        /// Address family of the socket.
        family: IpFamily,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Every probe identifier for a family has been handed out.
    #[error("No free {family} probe identifiers")]
    IdsExhausted {
        /// Address family of the socket.
        family: IpFamily,
    },

    /// A probe's reply channel was closed underneath it.
    #[error("{family} reply channel closed")]
    ChannelClosed {
        /// Address family of the socket.
        family: IpFamily,
    },
}
