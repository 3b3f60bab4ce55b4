//! Periodic change monitor for one table scope.

use super::change::{ChangeRecord, diff};
use super::entry::{Snapshot, TableEntry};
use super::sampler::Sampler;
use super::source::{AcquisitionError, TableSource};
use crate::events::{LogEvent, SharedSink};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Samples a table at a fixed interval and reports differences.
///
/// The previous snapshot is owned by the monitor and replaced wholesale at
/// the end of every tick; nothing else reads it. It starts empty, so the
/// first tick reports every monitored row as added.
pub struct ChangeMonitor<E: TableEntry, S> {
    sampler: Sampler<E, S>,
    interval: Duration,
    sink: SharedSink,
    previous: Snapshot<E>,
}

impl<E, S> ChangeMonitor<E, S>
where
    E: TableEntry,
    S: TableSource,
{
    /// Creates a monitor.
    ///
    /// # Arguments
    ///
    /// * `sampler` - Produces the snapshot for each tick
    /// * `interval` - Sleep between ticks
    /// * `sink` - Receives change events
    #[must_use]
    pub fn new(sampler: Sampler<E, S>, interval: Duration, sink: SharedSink) -> Self {
        Self {
            sampler,
            interval,
            sink,
            previous: Snapshot::new(),
        }
    }

    /// Returns the configured interval between ticks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the snapshot retained from the last tick.
    #[must_use]
    pub const fn previous(&self) -> &Snapshot<E> {
        &self.previous
    }

    /// Runs one tick: sample, diff, report, retain.
    ///
    /// # Errors
    ///
    /// Returns the sampler's [`AcquisitionError`]; the retained snapshot is
    /// left untouched in that case.
    pub async fn tick(&mut self) -> Result<ChangeRecord<E>, AcquisitionError> {
        let current = self.sampler.sample().await?;
        let changes = diff(&self.previous, &current);
        self.report(&current, &changes);
        self.previous = current;
        Ok(changes)
    }

    /// Runs until cancelled or until the table cannot be read.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError`] if any sample fails. Cancellation is not
    /// an error and returns `Ok(())`.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), AcquisitionError> {
        tracing::debug!(
            module = E::MODULE.as_str(),
            devices = self.sampler.devices().len(),
            "Table monitor started (interval: {:?})",
            self.interval
        );

        loop {
            let changes = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                result = self.tick() => result?,
            };
            tracing::debug!(
                module = E::MODULE.as_str(),
                "Tick complete: {} change(s), {} entries",
                changes.len(),
                self.previous.len()
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn report(&self, current: &Snapshot<E>, changes: &ChangeRecord<E>) {
        for entry in current.iter() {
            if let Some(notice) = entry.notice() {
                self.sink.emit(notice);
            }
        }

        for entry in &changes.added {
            self.emit(LogEvent::info(E::MODULE, E::ADDED), entry.fields(self.name_of(entry)));
        }
        for entry in &changes.removed {
            self.emit(LogEvent::info(E::MODULE, E::REMOVED), entry.fields(self.name_of(entry)));
        }
        for change in &changes.changed {
            let fields =
                E::changed_fields(&change.previous, &change.current, self.name_of(&change.current));
            self.emit(LogEvent::warn(E::MODULE, E::CHANGED), fields);
        }

        if changes.is_empty() {
            self.sink.emit(LogEvent::info(E::MODULE, E::NO_CHANGES));
        }
    }

    fn emit(&self, event: LogEvent, fields: Vec<(&'static str, String)>) {
        self.sink.emit(event.with_fields(fields));
    }

    fn name_of(&self, entry: &E) -> Option<&str> {
        entry
            .device_ip()
            .and_then(|ip| self.sampler.devices().name_of(&ip))
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
