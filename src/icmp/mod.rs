//! ICMP echo probing with shared per-family sockets.
//!
//! This module provides types and functions for:
//! - Encoding requests and decoding replies ([`packet`])
//! - Sending and receiving over ICMP sockets ([`EchoTransport`], [`IcmpSocket`])
//! - Routing replies to waiting probes ([`Demultiplexer`], [`Registration`])
//! - Periodic per-device probing ([`ProbeLoop`])
//! - Starting it all under a [`Supervisor`](crate::supervisor::Supervisor) ([`IcmpMonitor`])

mod demux;
mod error;
mod monitor;
pub mod packet;
mod probe;
mod transport;

pub use demux::{Demultiplexer, Dispatch, Registration};
pub use error::IcmpError;
pub use monitor::IcmpMonitor;
pub use packet::EchoReply;
pub use probe::{ProbeLoop, ProbeOutcome};
pub use transport::{EchoTransport, IcmpSocket, SocketKind};
