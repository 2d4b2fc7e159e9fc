//! Buffer counters

use serde::{Deserialize, Serialize};

use crate::id::SequenceId;

/// Point-in-time view of an [`EventBuffer`](crate::EventBuffer)'s counters
///
/// Captured under the buffer lock, so `appended == len + evicted + removed`
/// always holds for a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferStats {
    /// Configured capacity
    pub capacity: usize,
    /// Entries currently held
    pub len: usize,
    /// Total entries ever appended
    pub appended: u64,
    /// Entries dropped because the buffer was full
    pub evicted: u64,
    /// Entries removed after a successful publish
    pub removed: u64,
    /// Most recently assigned id
    pub last_id: SequenceId,
}

impl BufferStats {
    /// Fraction of capacity in use (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.len as f64 / self.capacity as f64
    }

    /// Whether the next append will evict
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization() {
        let stats = BufferStats {
            capacity: 4,
            len: 1,
            ..Default::default()
        };
        assert!((stats.utilization() - 0.25).abs() < f64::EPSILON);
        assert!(!stats.is_full());

        let full = BufferStats {
            capacity: 4,
            len: 4,
            ..Default::default()
        };
        assert!(full.is_full());
        assert_eq!(BufferStats::default().utilization(), 0.0);
    }
}
