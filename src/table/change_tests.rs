//! Tests for snapshot diffing.

use super::*;
use crate::table::{ArpEntry, RouteEntry, TableEntry};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

fn arp(ip: &str, mac: &str, iface: &str) -> ArpEntry {
    ArpEntry::new(ip.parse().unwrap(), mac, iface)
}

fn snapshot(entries: Vec<ArpEntry>) -> Snapshot<ArpEntry> {
    Snapshot::from_entries(entries)
}

mod boundaries {
    use super::*;

    #[test]
    fn empty_to_empty_returns_no_changes() {
        let record = diff::<ArpEntry>(&Snapshot::new(), &Snapshot::new());
        assert!(record.is_empty());
        assert_eq!(record.len(), 0);
    }

    #[test]
    fn empty_previous_reports_everything_added() {
        let current = snapshot(vec![
            arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0"),
            arp("10.0.0.6", "11:22:33:44:55:66", "eth0"),
        ]);

        let record = diff(&Snapshot::new(), &current);

        assert_eq!(record.added, current.iter().cloned().collect::<Vec<_>>());
        assert!(record.removed.is_empty());
        assert!(record.changed.is_empty());
    }

    #[test]
    fn empty_current_reports_everything_removed() {
        let previous = snapshot(vec![
            arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0"),
            arp("10.0.0.6", "11:22:33:44:55:66", "eth0"),
        ]);

        let record = diff(&previous, &Snapshot::new());

        assert_eq!(record.removed, previous.iter().cloned().collect::<Vec<_>>());
        assert!(record.added.is_empty());
        assert!(record.changed.is_empty());
    }

    #[test]
    fn identical_snapshots_produce_nothing() {
        let table = snapshot(vec![
            arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0"),
            arp("10.0.0.6", "11:22:33:44:55:66", "eth1"),
        ]);

        assert!(diff(&table, &table).is_empty());
    }
}

mod classification {
    use super::*;

    #[test]
    fn mac_flap_and_new_neighbour() {
        let previous = snapshot(vec![arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0")]);
        let current = snapshot(vec![
            arp("10.0.0.5", "cc:dd:ee:ff:00:11", "eth0"),
            arp("10.0.0.6", "ee:ff:00:11:22:33", "eth0"),
        ]);

        let record = diff(&previous, &current);

        assert_eq!(record.added, vec![arp("10.0.0.6", "ee:ff:00:11:22:33", "eth0")]);
        assert!(record.removed.is_empty());
        assert_eq!(
            record.changed,
            vec![Changed {
                previous: arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0"),
                current: arp("10.0.0.5", "cc:dd:ee:ff:00:11", "eth0"),
            }]
        );
    }

    #[test]
    fn changed_entries_share_a_key_and_differ() {
        let previous = snapshot(vec![
            arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0"),
            arp("10.0.0.7", "aa:aa:aa:aa:aa:aa", "eth0"),
        ]);
        let current = snapshot(vec![
            arp("10.0.0.5", "cc:dd:ee:ff:00:11", "eth1"),
            arp("10.0.0.7", "bb:bb:bb:bb:bb:bb", "eth0"),
        ]);

        let record = diff(&previous, &current);

        assert_eq!(record.changed.len(), 2);
        for change in &record.changed {
            assert_eq!(change.previous.key(), change.current.key());
            assert!(!change.previous.same_state(&change.current));
        }
    }

    #[test]
    fn removed_and_added_in_one_tick() {
        let previous = snapshot(vec![arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0")]);
        let current = snapshot(vec![arp("10.0.0.6", "aa:bb:cc:dd:ee:ff", "eth0")]);

        let record = diff(&previous, &current);

        assert_eq!(record.removed, vec![arp("10.0.0.5", "aa:bb:cc:dd:ee:ff", "eth0")]);
        assert_eq!(record.added, vec![arp("10.0.0.6", "aa:bb:cc:dd:ee:ff", "eth0")]);
        assert!(record.changed.is_empty());
    }

    #[test]
    fn route_expiry_drift_is_not_a_change() {
        let previous = Snapshot::from_entries(vec![RouteEntry::new(
            "10.0.0.5",
            "aa:bb:cc:dd:ee:ff",
            "UHLWIi",
            "en0",
            Duration::from_secs(1200),
        )]);
        let current = Snapshot::from_entries(vec![RouteEntry::new(
            "10.0.0.5",
            "aa:bb:cc:dd:ee:ff",
            "UHLWIi",
            "en0",
            Duration::from_secs(1190),
        )]);

        assert!(diff(&previous, &current).is_empty());
    }

    #[test]
    fn route_gateway_change() {
        let previous = Snapshot::from_entries(vec![RouteEntry::new(
            "default",
            "10.0.0.1",
            "UGScg",
            "en0",
            Duration::ZERO,
        )]);
        let current = Snapshot::from_entries(vec![RouteEntry::new(
            "default",
            "10.0.0.254",
            "UGScg",
            "en0",
            Duration::ZERO,
        )]);

        let record = diff(&previous, &current);

        assert_eq!(record.changed.len(), 1);
        assert_eq!(record.changed[0].previous.gw, "10.0.0.1");
        assert_eq!(record.changed[0].current.gw, "10.0.0.254");
    }
}

mod properties {
    use super::*;

    fn fixtures() -> Vec<(Snapshot<ArpEntry>, Snapshot<ArpEntry>)> {
        let a = arp("10.0.0.1", "aa:aa:aa:aa:aa:aa", "eth0");
        let b = arp("10.0.0.2", "bb:bb:bb:bb:bb:bb", "eth0");
        let b2 = arp("10.0.0.2", "b2:b2:b2:b2:b2:b2", "eth0");
        let c = arp("10.0.0.3", "cc:cc:cc:cc:cc:cc", "eth0");
        let c_moved = arp("10.0.0.3", "cc:cc:cc:cc:cc:cc", "eth1");
        let d = arp("10.0.0.4", "dd:dd:dd:dd:dd:dd", "eth0");

        vec![
            (snapshot(vec![]), snapshot(vec![a.clone()])),
            (snapshot(vec![a.clone(), b.clone()]), snapshot(vec![])),
            (
                snapshot(vec![a.clone(), b.clone(), c.clone()]),
                snapshot(vec![b2.clone(), c_moved.clone(), d.clone()]),
            ),
            (snapshot(vec![a.clone(), b2]), snapshot(vec![a, b, c, d])),
        ]
    }

    #[test]
    fn every_key_is_accounted_for_exactly_once() {
        for (previous, current) in fixtures() {
            let record = diff(&previous, &current);

            let union: BTreeSet<IpAddr> = previous.keys().chain(current.keys()).copied().collect();

            let mut seen: Vec<IpAddr> = Vec::new();
            seen.extend(record.added.iter().map(|e| e.ip));
            seen.extend(record.removed.iter().map(|e| e.ip));
            seen.extend(record.changed.iter().map(|c| c.current.ip));
            seen.extend(previous.iter().filter(|old| {
                current.get(old.key()).is_some_and(|new| old.same_state(new))
            }).map(|e| e.ip));

            let as_set: BTreeSet<IpAddr> = seen.iter().copied().collect();
            assert_eq!(seen.len(), as_set.len(), "a key was classified twice");
            assert_eq!(as_set, union);
        }
    }

    #[test]
    fn diff_with_itself_is_empty() {
        for (previous, current) in fixtures() {
            assert!(diff(&previous, &previous).is_empty());
            assert!(diff(&current, &current).is_empty());
        }
    }

    #[test]
    fn result_does_not_depend_on_row_order() {
        let rows = vec![
            arp("10.0.0.3", "cc:cc:cc:cc:cc:cc", "eth0"),
            arp("10.0.0.1", "aa:aa:aa:aa:aa:aa", "eth0"),
            arp("10.0.0.2", "bb:bb:bb:bb:bb:bb", "eth0"),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let previous = snapshot(vec![arp("10.0.0.2", "00:00:00:00:00:00", "eth0")]);

        assert_eq!(
            diff(&previous, &snapshot(rows)),
            diff(&previous, &snapshot(reversed))
        );
    }

    #[test]
    fn later_duplicate_row_wins() {
        let table = snapshot(vec![
            arp("10.0.0.1", "aa:aa:aa:aa:aa:aa", "eth0"),
            arp("10.0.0.1", "bb:bb:bb:bb:bb:bb", "eth0"),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&"10.0.0.1".parse().unwrap()).map(|e| e.mac.as_str()),
            Some("bb:bb:bb:bb:bb:bb")
        );
    }
}
