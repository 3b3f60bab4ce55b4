//! Wiring of CGI pollers and per-host sessions.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::IpAddr;
use std::sync::Arc;

use super::client::ReqwestClient;
use super::error::{CgiError, HttpError};
use super::http::HttpClient;
use super::poller::{CgiPoller, HostSession};
use super::target::CgiTarget;
use crate::events::SharedSink;
use crate::supervisor::Supervisor;

/// Starts CGI polling for a set of endpoints.
///
/// Endpoints on the same device share one client, and so one cookie jar
/// and one digest challenge. Each endpoint runs its own poller.
pub struct CgiMonitor {
    targets: Vec<CgiTarget>,
    sink: SharedSink,
}

impl CgiMonitor {
    /// Creates a monitor for `targets`.
    #[must_use]
    pub const fn new(targets: Vec<CgiTarget>, sink: SharedSink) -> Self {
        Self { targets, sink }
    }

    /// Endpoints that will be polled.
    #[must_use]
    pub fn targets(&self) -> &[CgiTarget] {
        &self.targets
    }

    /// Builds reqwest clients and spawns every poller into `supervisor`.
    ///
    /// # Errors
    ///
    /// Returns [`CgiError`] if a client cannot be built or an endpoint URL
    /// is invalid. Nothing is spawned in that case.
    pub fn spawn(self, supervisor: &mut Supervisor) -> Result<(), CgiError> {
        self.spawn_with(supervisor, |_| ReqwestClient::with_cookie_store())
    }

    /// Like [`spawn`](Self::spawn), with a custom client factory.
    ///
    /// The factory is called once per distinct device address.
    ///
    /// # Errors
    ///
    /// Returns the first factory or URL error.
    pub fn spawn_with<C, F>(self, supervisor: &mut Supervisor, mut connect: F) -> Result<(), CgiError>
    where
        C: HttpClient,
        F: FnMut(IpAddr) -> Result<C, HttpError>,
    {
        let mut sessions = HashMap::new();
        let mut pollers = Vec::with_capacity(self.targets.len());
        for target in self.targets {
            let session = match sessions.entry(target.device.ip) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(entry) => {
                    let session = HostSession::shared(connect(target.device.ip)?);
                    Arc::clone(entry.insert(session))
                }
            };
            pollers.push(CgiPoller::new(target, session, self.sink.clone())?);
        }

        tracing::info!(
            module = "cgi",
            endpoints = pollers.len(),
            hosts = sessions.len(),
            "CGI polling started"
        );
        let cancel = supervisor.token();
        for poller in pollers {
            supervisor.spawn(poller.task_name(), poller.run(cancel.clone()));
        }
        Ok(())
    }
}
