//! The bounded event buffer
//!
//! [`EventBuffer`] is a fixed-capacity FIFO of `(id, payload)` entries.
//! Producers [`append`](EventBuffer::append) continuously; a flusher takes a
//! [`snapshot`](EventBuffer::snapshot), publishes it with no lock held, and
//! on success calls [`remove`](EventBuffer::remove) with that same snapshot.
//!
//! ## Thread Safety
//!
//! All state lives behind one `parking_lot::Mutex`. Ids are drawn while the
//! lock is held, so entries are always ordered by increasing id and the
//! head of the queue is always the oldest entry present.
//!
//! ## Example
//!
//! ```
//! use outbox_core::EventBuffer;
//!
//! let buffer = EventBuffer::new(5).unwrap();
//! for i in 1..=10 {
//!     buffer.append(format!("e{i}"));
//! }
//!
//! let snapshot = buffer.snapshot();
//! assert_eq!(snapshot.len(), 5);
//!
//! buffer.append("e11".to_string());
//! buffer.append("e12".to_string());
//!
//! // publish(snapshot.payloads()) succeeded
//! buffer.remove(&snapshot);
//! assert_eq!(buffer.snapshot().cloned_payloads(), vec!["e11", "e12"]);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::config::BufferConfig;
use crate::entry::Entry;
use crate::error::BufferError;
use crate::id::{IdGenerator, SequenceId};
use crate::snapshot::Snapshot;
use crate::stats::BufferStats;

/// Mutable state guarded by the buffer lock
#[derive(Debug)]
struct Inner<T> {
    entries: VecDeque<Arc<Entry<T>>>,
    appended: u64,
    evicted: u64,
    removed: u64,
}

/// Bounded, FIFO-evicting staging buffer
///
/// Share between producers and the flusher as `Arc<EventBuffer<T>>`.
#[derive(Debug)]
pub struct EventBuffer<T> {
    capacity: usize,
    ids: IdGenerator,
    inner: Mutex<Inner<T>>,
}

impl<T> EventBuffer<T> {
    /// Create a buffer holding at most `capacity` entries
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        Self::from_config(&BufferConfig::with_capacity(capacity))
    }

    /// Create a buffer from configuration
    pub fn from_config(config: &BufferConfig) -> Result<Self, BufferError> {
        config.validate()?;
        info!(capacity = config.capacity, "Event buffer created");

        Ok(Self {
            capacity: config.capacity,
            ids: IdGenerator::new(),
            inner: Mutex::new(Inner {
                entries: VecDeque::new(),
                appended: 0,
                evicted: 0,
                removed: 0,
            }),
        })
    }

    /// Append a payload, evicting the oldest entry if the buffer is full
    ///
    /// Never blocks beyond the critical section and never fails.
    pub fn append(&self, payload: T) -> SequenceId {
        let mut inner = self.inner.lock();

        let id = self.ids.next_id();
        inner.entries.push_back(Arc::new(Entry::new(id, payload)));
        inner.appended += 1;

        let evicted = if inner.entries.len() > self.capacity {
            inner.evicted += 1;
            inner.entries.pop_front()
        } else {
            None
        };
        drop(inner);

        trace!(id = %id, "Appended event");
        if let Some(oldest) = evicted {
            debug!(
                evicted = %oldest.id(),
                capacity = self.capacity,
                "Buffer full, evicted oldest event"
            );
        }

        id
    }

    /// Capture the current contents, oldest first
    ///
    /// Payloads are shared, not cloned; the lock is held only while the
    /// entry pointers are copied.
    pub fn snapshot(&self) -> Snapshot<T> {
        let entries: Vec<_> = self.inner.lock().entries.iter().cloned().collect();
        trace!(len = entries.len(), "Captured snapshot");
        Snapshot::from_entries(entries)
    }

    /// Remove the published entries of `snapshot` from the buffer
    ///
    /// Pops the head of the buffer while it is an entry captured by
    /// `snapshot` and stops at the first head that is not. Only the oldest
    /// contiguous run is ever touched, so entries appended after the snapshot
    /// survive, and ids that were already evicted are simply not found.
    /// Entries are matched by identity, so a snapshot from another buffer
    /// removes nothing even when its ids overlap.
    ///
    /// Returns the number of entries removed.
    pub fn remove(&self, snapshot: &Snapshot<T>) -> usize {
        let Some(last_id) = snapshot.last_id() else {
            return 0;
        };

        let mut inner = self.inner.lock();
        let mut removed = 0usize;
        while let Some(head) = inner.entries.front() {
            // Ids past the snapshot's newest can never be members
            if head.id() > last_id || !snapshot.holds(head) {
                break;
            }
            inner.entries.pop_front();
            removed += 1;
        }
        inner.removed += removed as u64;
        let remaining = inner.entries.len();
        drop(inner);

        debug!(
            removed,
            skipped = snapshot.len() - removed,
            remaining,
            "Removed published events"
        );

        removed
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the buffer holds nothing
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Fixed capacity chosen at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently assigned id, or [`SequenceId::NONE`]
    pub fn last_id(&self) -> SequenceId {
        self.ids.last_issued()
    }

    /// Consistent view of the buffer's counters
    pub fn stats(&self) -> BufferStats {
        let inner = self.inner.lock();
        BufferStats {
            capacity: self.capacity,
            len: inner.entries.len(),
            appended: inner.appended,
            evicted: inner.evicted,
            removed: inner.removed,
            last_id: self.ids.last_issued(),
        }
    }
}
