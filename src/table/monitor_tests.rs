//! Tests for `ChangeMonitor` behavior.

use super::*;
use crate::device::{Device, DeviceIndex};
use crate::events::Severity;
use crate::table::{ArpEntry, RouteEntry};
use crate::testing::RecordingSink;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted source: pops queued results, then repeats `fallback`.
struct ScriptedSource {
    results: Mutex<VecDeque<Result<Vec<String>, AcquisitionError>>>,
    fallback: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn repeating(lines: &[&str]) -> Self {
        Self::new(vec![], lines)
    }

    fn new(results: Vec<Result<Vec<&str>, AcquisitionError>>, fallback: &[&str]) -> Self {
        Self {
            results: Mutex::new(
                results
                    .into_iter()
                    .map(|r| r.map(|lines| lines.into_iter().map(String::from).collect()))
                    .collect(),
            ),
            fallback: fallback.iter().map(ToString::to_string).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TableSource for ScriptedSource {
    async fn read_lines(&self) -> Result<Vec<String>, AcquisitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

fn failure() -> AcquisitionError {
    AcquisitionError::Source {
        message: "arp unavailable".to_string(),
    }
}

fn devices() -> DeviceIndex {
    DeviceIndex::new(&[
        Device::new("cam", "10.0.0.5".parse().unwrap()),
        Device::new("nvr", "10.0.0.6".parse().unwrap()),
    ])
}

fn arp_monitor(
    source: ScriptedSource,
    sink: &Arc<RecordingSink>,
) -> ChangeMonitor<ArpEntry, ScriptedSource> {
    ChangeMonitor::new(
        Sampler::new(source, devices()),
        Duration::from_secs(10),
        sink.shared(),
    )
}

const CAM: &str = "? (10.0.0.5) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]";
const CAM_FLAPPED: &str = "? (10.0.0.5) at 11:22:33:44:55:66 on en0 ifscope [ethernet]";
const NVR: &str = "? (10.0.0.6) at 66:55:44:33:22:11 on en0 ifscope [ethernet]";

mod ticks {
    use super::*;

    #[tokio::test]
    async fn first_tick_reports_every_entry_as_added() {
        let sink = RecordingSink::new();
        let mut monitor = arp_monitor(ScriptedSource::repeating(&[CAM, NVR]), &sink);

        let record = monitor.tick().await.unwrap();

        assert_eq!(record.added.len(), 2);
        assert_eq!(sink.messages(), vec!["added arp entry", "added arp entry"]);
        let first = &sink.events()[0];
        assert_eq!(first.severity, Severity::Info);
        assert_eq!(first.field("name"), Some("cam"));
        assert_eq!(first.field("mac"), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(monitor.previous().len(), 2);
    }

    #[tokio::test]
    async fn unchanged_table_emits_one_no_changes_event_per_tick() {
        let sink = RecordingSink::new();
        let mut monitor = arp_monitor(ScriptedSource::repeating(&[CAM]), &sink);
        monitor.tick().await.unwrap();
        sink.clear();

        for _ in 0..3 {
            assert!(monitor.tick().await.unwrap().is_empty());
        }

        assert_eq!(sink.messages(), vec!["no changes in arp table"; 3]);
    }

    #[tokio::test]
    async fn empty_table_is_a_no_change_heartbeat() {
        let sink = RecordingSink::new();
        let mut monitor = arp_monitor(ScriptedSource::repeating(&[]), &sink);

        for _ in 0..3 {
            monitor.tick().await.unwrap();
        }

        assert_eq!(sink.count("no changes in arp table"), 3);
        assert_eq!(sink.events().len(), 3);
    }

    #[tokio::test]
    async fn mac_flap_is_a_warning_with_previous_values() {
        let sink = RecordingSink::new();
        let source = ScriptedSource::new(vec![Ok(vec![CAM])], &[CAM_FLAPPED]);
        let mut monitor = arp_monitor(source, &sink);
        monitor.tick().await.unwrap();
        sink.clear();

        let record = monitor.tick().await.unwrap();

        assert_eq!(record.changed.len(), 1);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "changed arp entry");
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(
            events[0].keys(),
            vec!["name", "ip", "mac", "iface", "previous_mac", "previous_iface"]
        );
        assert_eq!(events[0].field("mac"), Some("11:22:33:44:55:66"));
        assert_eq!(events[0].field("previous_mac"), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[tokio::test]
    async fn disappearing_entry_is_removed() {
        let sink = RecordingSink::new();
        let source = ScriptedSource::new(vec![Ok(vec![CAM, NVR])], &[CAM]);
        let mut monitor = arp_monitor(source, &sink);
        monitor.tick().await.unwrap();
        sink.clear();

        monitor.tick().await.unwrap();

        assert_eq!(sink.messages(), vec!["removed arp entry"]);
        assert_eq!(sink.events()[0].field("name"), Some("nvr"));
    }

    #[tokio::test]
    async fn failed_sample_keeps_previous_snapshot() {
        let sink = RecordingSink::new();
        let source = ScriptedSource::new(vec![Ok(vec![CAM]), Err(failure())], &[CAM]);
        let mut monitor = arp_monitor(source, &sink);
        monitor.tick().await.unwrap();
        sink.clear();

        assert!(monitor.tick().await.is_err());
        assert_eq!(monitor.previous().len(), 1);
        assert!(sink.events().is_empty());

        monitor.tick().await.unwrap();
        assert_eq!(sink.messages(), vec!["no changes in arp table"]);
    }
}

mod routes {
    use super::*;

    const HOST_ROUTE: &str = "10.0.0.5           aa:bb:cc:dd:ee:ff  UHLWIi            en0   12";

    #[tokio::test]
    async fn expiring_route_is_reported_every_tick() {
        let sink = RecordingSink::new();
        let mut monitor: ChangeMonitor<RouteEntry, _> = ChangeMonitor::new(
            Sampler::new(ScriptedSource::repeating(&[HOST_ROUTE]), devices()),
            Duration::from_secs(10),
            sink.shared(),
        );

        monitor.tick().await.unwrap();
        monitor.tick().await.unwrap();

        assert_eq!(
            sink.messages(),
            vec![
                "route expiring soon",
                "added route table entry",
                "route expiring soon",
                "no changes in route table",
            ]
        );
        assert_eq!(sink.events()[0].severity, Severity::Warning);
    }
}

mod run_loop {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop_cleanly() {
        let sink = RecordingSink::new();
        let source = ScriptedSource::repeating(&[]);
        let calls = Arc::clone(&source.calls);
        let monitor = arp_monitor(source, &sink);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(monitor.run(cancel.clone()));
        tokio::time::sleep(Duration::from_secs(25)).await;
        cancel.cancel();

        assert!(handle.await.unwrap().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.count("no changes in arp table"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn acquisition_error_is_fatal() {
        let sink = RecordingSink::new();
        let source = ScriptedSource::new(vec![Ok(vec![CAM]), Err(failure())], &[CAM]);
        let monitor = arp_monitor(source, &sink);

        let result = monitor.run(CancellationToken::new()).await;

        assert!(matches!(result, Err(AcquisitionError::Source { .. })));
        assert_eq!(sink.messages(), vec!["added arp entry"]);
    }

    #[tokio::test]
    async fn already_cancelled_does_not_sample() {
        let sink = RecordingSink::new();
        let source = ScriptedSource::repeating(&[CAM]);
        let calls = Arc::clone(&source.calls);
        let monitor = arp_monitor(source, &sink);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(monitor.run(cancel).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sink.events().is_empty());
    }
}
