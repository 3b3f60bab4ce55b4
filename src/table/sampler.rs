//! Turns raw source output into filtered snapshots.

use super::entry::{Snapshot, TableEntry};
use super::source::{AcquisitionError, TableSource};
use crate::device::DeviceIndex;
use std::marker::PhantomData;

/// Samples one table for the devices of one scope.
///
/// Lines that do not parse are skipped. Rows that do not describe a
/// monitored device are dropped.
pub struct Sampler<E, S> {
    source: S,
    devices: DeviceIndex,
    _entry: PhantomData<fn() -> E>,
}

impl<E, S> Sampler<E, S>
where
    E: TableEntry,
    S: TableSource,
{
    /// Creates a sampler reading from `source` and keeping rows for `devices`.
    #[must_use]
    pub const fn new(source: S, devices: DeviceIndex) -> Self {
        Self {
            source,
            devices,
            _entry: PhantomData,
        }
    }

    /// Returns the devices this sampler keeps rows for.
    #[must_use]
    pub const fn devices(&self) -> &DeviceIndex {
        &self.devices
    }

    /// Captures the current table.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`AcquisitionError`].
    pub async fn sample(&self) -> Result<Snapshot<E>, AcquisitionError> {
        let lines = self.source.read_lines().await?;
        Ok(lines
            .iter()
            .filter_map(|line| E::parse(line))
            .filter(|entry| entry.device_ip().is_some_and(|ip| self.devices.contains(&ip)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::table::ArpEntry;

    struct StaticSource(Vec<&'static str>);

    impl TableSource for StaticSource {
        async fn read_lines(&self) -> Result<Vec<String>, AcquisitionError> {
            Ok(self.0.iter().map(ToString::to_string).collect())
        }
    }

    struct FailingSource;

    impl TableSource for FailingSource {
        async fn read_lines(&self) -> Result<Vec<String>, AcquisitionError> {
            Err(AcquisitionError::Source {
                message: "unavailable".to_string(),
            })
        }
    }

    fn index() -> DeviceIndex {
        DeviceIndex::new(&[Device::new("cam", "10.0.0.5".parse().unwrap())])
    }

    #[tokio::test]
    async fn keeps_only_monitored_devices() {
        let source = StaticSource(vec![
            "? (10.0.0.5) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]",
            "? (10.0.0.6) at 11:22:33:44:55:66 on en0 ifscope [ethernet]",
        ]);
        let sampler: Sampler<ArpEntry, _> = Sampler::new(source, index());

        let snapshot = sampler.sample().await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&"10.0.0.5".parse().unwrap()));
    }

    #[tokio::test]
    async fn unparsable_lines_are_skipped() {
        let source = StaticSource(vec![
            "garbage",
            "? (10.0.0.5) at (incomplete) on en0 ifscope [ethernet]",
            "? (10.0.0.5) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]",
        ]);
        let sampler: Sampler<ArpEntry, _> = Sampler::new(source, index());

        let snapshot = sampler.sample().await.unwrap();

        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn empty_output_is_an_empty_snapshot() {
        let sampler: Sampler<ArpEntry, _> = Sampler::new(StaticSource(vec![]), index());
        assert!(sampler.sample().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn source_errors_propagate() {
        let sampler: Sampler<ArpEntry, _> = Sampler::new(FailingSource, index());
        assert!(sampler.sample().await.is_err());
    }
}
