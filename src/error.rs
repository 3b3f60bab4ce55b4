//! Errors that end a monitoring run.

use crate::icmp::IcmpError;
use crate::syslog::SyslogError;
use crate::table::AcquisitionError;
use std::convert::Infallible;
use thiserror::Error;

/// A fatal error from one of the supervised monitors.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// ICMP socket or probe failure.
    #[error(transparent)]
    Icmp(#[from] IcmpError),

    /// A system table could not be read.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// The syslog socket failed.
    #[error(transparent)]
    Syslog(#[from] SyslogError),

    /// A task ended abnormally.
    #[error("Task '{task}' failed: {reason}")]
    TaskFailed {
        /// Name the task was spawned under.
        task: String,
        /// Panic message or join error.
        reason: String,
    },
}

impl From<Infallible> for MonitorError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
