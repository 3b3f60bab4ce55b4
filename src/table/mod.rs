//! Change detection for system tables.
//!
//! This module provides types and functions for:
//! - Representing keyed table rows and snapshots ([`TableEntry`], [`Snapshot`])
//! - Detecting changes between snapshots ([`diff`], [`ChangeRecord`])
//! - ARP and routing table rows ([`ArpEntry`], [`RouteEntry`])
//! - Reading raw tables ([`TableSource`], [`CommandSource`])
//! - Periodic monitoring ([`Sampler`], [`ChangeMonitor`])

mod arp;
mod change;
mod entry;
mod monitor;
mod route;
mod sampler;
mod source;

pub use arp::{ARP_COMMAND, ArpEntry};
pub use change::{ChangeRecord, Changed, diff};
pub use entry::{Snapshot, TableEntry};
pub use monitor::ChangeMonitor;
pub use route::{EXPIRY_WARNING_THRESHOLD, ROUTE_COMMAND, RouteEntry};
pub use sampler::Sampler;
pub use source::{AcquisitionError, CommandSource, TableSource};

/// ARP table monitor reading from an external command.
pub type ArpMonitor = ChangeMonitor<ArpEntry, CommandSource>;

/// Routing table monitor reading from an external command.
pub type RouteMonitor = ChangeMonitor<RouteEntry, CommandSource>;
