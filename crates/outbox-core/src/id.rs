//! Sequence identifiers for buffered events
//!
//! Every successfully appended event receives a [`SequenceId`] drawn from
//! an [`IdGenerator`]. Ids are identity tokens, not positions: they are
//! never reused and never decrease, so "remove exactly these events" stays
//! well defined after evictions and later insertions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identity of one appended event
///
/// `SequenceId::NONE` (zero) is reserved and never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(u64);

impl SequenceId {
    /// Reserved "no id" value
    pub const NONE: SequenceId = SequenceId(0);

    /// The first id handed out by a fresh generator
    pub const FIRST: SequenceId = SequenceId(1);

    /// Wrap a raw value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Check whether this is the reserved "no id" value
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for SequenceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SequenceId> for u64 {
    fn from(id: SequenceId) -> Self {
        id.0
    }
}

/// Monotonic, thread-safe id source
///
/// Each call to [`next_id`](IdGenerator::next_id) returns a value strictly
/// greater than every value previously returned by the same generator.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Create a generator whose first id is [`SequenceId::FIRST`]
    pub fn new() -> Self {
        Self::starting_at(SequenceId::FIRST)
    }

    /// Create a generator starting at `first`
    ///
    /// A `first` of [`SequenceId::NONE`] is bumped to [`SequenceId::FIRST`].
    pub fn starting_at(first: SequenceId) -> Self {
        Self {
            next: AtomicU64::new(first.get().max(1)),
        }
    }

    /// Issue the next id
    pub fn next_id(&self) -> SequenceId {
        SequenceId(self.next.fetch_add(1, Ordering::AcqRel))
    }

    /// The most recently issued id, or [`SequenceId::NONE`] if none yet
    pub fn last_issued(&self) -> SequenceId {
        SequenceId(self.next.load(Ordering::Acquire).saturating_sub(1))
    }
}
