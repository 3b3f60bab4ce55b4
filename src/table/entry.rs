//! Keyed table rows and point-in-time snapshots.

use crate::events::{LogEvent, Module};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

/// A row of a system table that can be diffed across snapshots.
///
/// Each implementation fixes the identity key, which non-key fields count
/// as a change, how a row is parsed from the source's text output and how
/// rows are rendered into event fields.
pub trait TableEntry: Clone + fmt::Debug + Send + Sync + 'static {
    /// Identity of a row within one snapshot.
    type Key: Ord + Clone + fmt::Debug + Send + Sync;

    /// Module that events for this table are attributed to.
    const MODULE: Module;
    /// Message for an entry present only in the current snapshot.
    const ADDED: &'static str;
    /// Message for an entry present only in the previous snapshot.
    const REMOVED: &'static str;
    /// Message for an entry whose tracked fields differ.
    const CHANGED: &'static str;
    /// Message for a tick without any difference.
    const NO_CHANGES: &'static str;

    /// Returns the identity key.
    fn key(&self) -> &Self::Key;

    /// Returns true if the tracked non-key fields are equal.
    fn same_state(&self, other: &Self) -> bool;

    /// Parses one line of source output. Unparsable lines yield `None`.
    fn parse(line: &str) -> Option<Self>;

    /// Returns the address of the device this row describes, if any.
    fn device_ip(&self) -> Option<IpAddr>;

    /// Renders the fields for an added or removed event.
    fn fields(&self, name: Option<&str>) -> Vec<(&'static str, String)>;

    /// Renders the fields for a changed event.
    fn changed_fields(previous: &Self, current: &Self, name: Option<&str>)
    -> Vec<(&'static str, String)>;

    /// Returns an event to emit for this row on every tick, regardless of
    /// whether it changed.
    fn notice(&self) -> Option<LogEvent> {
        None
    }
}

/// One point-in-time capture of a table, at most one entry per key.
///
/// Iteration is in key order, so anything derived from a snapshot is
/// independent of the order the source reported rows in.
#[derive(Debug, Clone)]
pub struct Snapshot<E: TableEntry> {
    entries: BTreeMap<E::Key, E>,
}

impl<E: TableEntry> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<E: TableEntry> Snapshot<E> {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from rows. A later row replaces an earlier one
    /// with the same key.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = E>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.key().clone(), e)).collect(),
        }
    }

    /// Returns the entry with the given key.
    #[must_use]
    pub fn get(&self, key: &E::Key) -> Option<&E> {
        self.entries.get(key)
    }

    /// Returns true if an entry with the given key exists.
    #[must_use]
    pub fn contains_key(&self, key: &E::Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.values()
    }

    /// Iterates keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &E::Key> {
        self.entries.keys()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: TableEntry> FromIterator<E> for Snapshot<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}
