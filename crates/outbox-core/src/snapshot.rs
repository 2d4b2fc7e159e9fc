//! Point-in-time copies of buffer contents
//!
//! A [`Snapshot`] shares entries with the live buffer through `Arc`, but
//! the sequence of entries it holds is fixed at capture time. Later appends,
//! evictions and removals on the buffer are invisible to it.

use std::sync::Arc;

use crate::entry::Entry;
use crate::id::SequenceId;

/// Immutable, ordered (oldest-first) copy of the buffer's entries
#[derive(Debug)]
pub struct Snapshot<T> {
    entries: Arc<[Arc<Entry<T>>]>,
}

// Manual impl so cloning a snapshot never requires `T: Clone`
impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Snapshot<T> {
    /// A snapshot holding nothing
    pub fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
        }
    }

    pub(crate) fn from_entries(entries: Vec<Arc<Entry<T>>>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].id() < w[1].id()));
        Self {
            entries: Arc::from(entries),
        }
    }

    /// Number of captured entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captured entries, oldest first
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &Entry<T>> + '_ {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    /// Captured ids, oldest first
    pub fn ids(&self) -> impl ExactSizeIterator<Item = SequenceId> + '_ {
        self.entries.iter().map(|entry| entry.id())
    }

    /// Whether `id` was captured
    ///
    /// Ids in a snapshot are strictly increasing, so this is a binary search.
    pub fn contains(&self, id: SequenceId) -> bool {
        self.entries
            .binary_search_by_key(&id, |entry| entry.id())
            .is_ok()
    }

    /// Whether `entry` is the very entry this snapshot captured
    ///
    /// Matches on identity, not just id, so a snapshot taken from another
    /// buffer never claims entries that happen to share its ids.
    pub(crate) fn holds(&self, entry: &Arc<Entry<T>>) -> bool {
        self.entries
            .binary_search_by_key(&entry.id(), |captured| captured.id())
            .is_ok_and(|index| Arc::ptr_eq(&self.entries[index], entry))
    }

    /// Id of the oldest captured entry
    pub fn first_id(&self) -> Option<SequenceId> {
        self.entries.first().map(|entry| entry.id())
    }

    /// Id of the newest captured entry
    pub fn last_id(&self) -> Option<SequenceId> {
        self.entries.last().map(|entry| entry.id())
    }

    /// Payloads in stored order, ids discarded
    pub fn payloads(&self) -> Vec<&T> {
        self.entries.iter().map(|entry| entry.payload()).collect()
    }

    /// Owned copies of the payloads in stored order
    pub fn cloned_payloads(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.entries
            .iter()
            .map(|entry| entry.payload().clone())
            .collect()
    }
}

/// Project a snapshot onto its payloads, oldest first
pub fn payloads<T>(snapshot: &Snapshot<T>) -> Vec<&T> {
    snapshot.payloads()
}
