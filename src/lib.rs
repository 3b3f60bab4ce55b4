//! netmon: device and network monitor
//!
//! A library for watching a fixed set of devices: ICMP liveness probing
//! over shared sockets, change detection on the ARP and routing tables,
//! scheduled calls to device CGI endpoints and a syslog receiver. Every
//! observation is emitted as a structured log event.

pub mod cgi;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod icmp;
pub mod supervisor;
pub mod syslog;
pub mod table;

#[cfg(test)]
mod testing;
