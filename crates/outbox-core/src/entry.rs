//! Buffered entries

use crate::id::SequenceId;

/// One `(id, payload)` record held in the buffer
///
/// Entries are immutable once created. The payload is opaque to the
/// buffer: it is never inspected, cloned or transformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    id: SequenceId,
    payload: T,
}

impl<T> Entry<T> {
    pub(crate) fn new(id: SequenceId, payload: T) -> Self {
        Self { id, payload }
    }

    /// The id assigned when this entry was appended
    pub fn id(&self) -> SequenceId {
        self.id
    }

    /// The caller-supplied payload
    pub fn payload(&self) -> &T {
        &self.payload
    }
}
