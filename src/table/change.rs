//! Change detection between two table snapshots.

use super::entry::{Snapshot, TableEntry};

/// An entry whose tracked fields differ between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changed<E> {
    /// The entry as it was in the previous snapshot.
    pub previous: E,
    /// The entry as it is in the current snapshot.
    pub current: E,
}

/// Differences between a previous and a current snapshot.
///
/// Every vector is ordered by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord<E> {
    /// Entries whose key appears only in the current snapshot.
    pub added: Vec<E>,
    /// Entries whose key appears only in the previous snapshot.
    pub removed: Vec<E>,
    /// Entries present in both with differing tracked fields.
    pub changed: Vec<Changed<E>>,
}

impl<E> Default for ChangeRecord<E> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

impl<E> ChangeRecord<E> {
    /// Returns true if nothing was added, removed or changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Returns the total number of reported differences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Compares two snapshots.
///
/// This is a pure function. Correspondence between rows is by
/// [`TableEntry::key`]; equality of corresponding rows is decided by
/// [`TableEntry::same_state`].
///
/// # Algorithm
///
/// 1. Keys only in `current` → `added`
/// 2. Keys only in `previous` → `removed`
/// 3. Keys in both whose state differs → `changed`, carrying both versions
///
/// Keys in both with equal state produce nothing.
#[must_use]
pub fn diff<E: TableEntry>(previous: &Snapshot<E>, current: &Snapshot<E>) -> ChangeRecord<E> {
    let mut record = ChangeRecord::default();

    for old in previous.iter() {
        if !current.contains_key(old.key()) {
            record.removed.push(old.clone());
        }
    }

    for new in current.iter() {
        match previous.get(new.key()) {
            None => record.added.push(new.clone()),
            Some(old) if !old.same_state(new) => record.changed.push(Changed {
                previous: old.clone(),
                current: new.clone(),
            }),
            Some(_) => {}
        }
    }

    record
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
