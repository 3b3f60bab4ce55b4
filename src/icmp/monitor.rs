//! Wiring of per-family sockets, read loops and probe loops.

use super::demux::Demultiplexer;
use super::error::IcmpError;
use super::probe::ProbeLoop;
use super::transport::{EchoTransport, IcmpSocket};
use crate::device::{IcmpDevice, IpFamily};
use crate::events::SharedSink;
use crate::supervisor::Supervisor;
use std::collections::HashMap;
use std::sync::Arc;

/// Starts ICMP monitoring for a set of devices.
///
/// One socket is opened per address family in use, shared by every probe
/// of that family and drained by a single read loop. Each device gets its
/// own probe loop with its own identifier. The sockets are closed once the
/// read loop and every probe loop using them have exited.
pub struct IcmpMonitor {
    devices: Vec<IcmpDevice>,
    sink: SharedSink,
}

impl IcmpMonitor {
    /// Creates a monitor for `devices`.
    #[must_use]
    pub const fn new(devices: Vec<IcmpDevice>, sink: SharedSink) -> Self {
        Self { devices, sink }
    }

    /// Devices that will be probed.
    #[must_use]
    pub fn devices(&self) -> &[IcmpDevice] {
        &self.devices
    }

    /// Address families with at least one device, in a stable order.
    #[must_use]
    pub fn families(&self) -> Vec<IpFamily> {
        let mut families: Vec<IpFamily> = self.devices.iter().map(|d| d.device.family()).collect();
        families.sort_by_key(|family| family.is_v6());
        families.dedup();
        families
    }

    /// Opens real ICMP sockets and spawns all tasks into `supervisor`.
    ///
    /// # Errors
    ///
    /// Returns [`IcmpError::Open`] if a needed socket cannot be opened.
    /// Nothing is spawned in that case.
    pub fn spawn(self, supervisor: &mut Supervisor) -> Result<(), IcmpError> {
        self.spawn_with(supervisor, |family| {
            let socket = IcmpSocket::open(family)?;
            tracing::info!(module = "ping", %family, kind = ?socket.kind(), "ICMP socket ready");
            Ok(socket)
        })
    }

    /// Like [`spawn`](Self::spawn), with a custom transport factory.
    ///
    /// # Errors
    ///
    /// Returns the factory's error for the first family it cannot serve.
    pub fn spawn_with<T, F>(self, supervisor: &mut Supervisor, mut open: F) -> Result<(), IcmpError>
    where
        T: EchoTransport,
        F: FnMut(IpFamily) -> Result<T, IcmpError>,
    {
        let mut demuxes = HashMap::new();
        for family in self.families() {
            demuxes.insert(family, Demultiplexer::new(open(family)?, self.sink.clone()));
        }

        let cancel = supervisor.token();
        for target in self.devices {
            let Some(demux) = demuxes.get(&target.device.family()) else {
                continue;
            };
            let name = format!("ping {}", target.device.name);
            let probe = ProbeLoop::new(target, Arc::clone(demux), self.sink.clone());
            supervisor.spawn(name, probe.run(cancel.clone()));
        }
        for (family, demux) in demuxes {
            supervisor.spawn(format!("icmp {family} reader"), demux.run(cancel.clone()));
        }
        Ok(())
    }
}
