//! # Outbox Core
//!
//! Bounded, in-memory staging buffer for events awaiting transmission to a
//! remote collector.
//!
//! Producers append events continuously. A periodic flusher takes a
//! consistent snapshot, publishes it, and only on success removes exactly
//! those events, no matter how many new events arrived in the meantime.
//!
//! ## Key Types
//!
//! - [`EventBuffer`]: Fixed-capacity FIFO with oldest-first eviction
//! - [`SequenceId`]: Never-reused identity assigned on append
//! - [`Snapshot`]: Immutable ordered copy of the buffer at one instant
//! - [`BufferStats`]: Append/evict/remove counters
//! - [`BufferConfig`]: Capacity configuration

pub mod buffer;
pub mod config;
pub mod entry;
pub mod error;
pub mod id;
pub mod snapshot;
pub mod stats;

// Re-export main types
pub use buffer::EventBuffer;
pub use config::{BufferConfig, CAPACITY_ENV, DEFAULT_CAPACITY};
pub use entry::Entry;
pub use error::BufferError;
pub use id::{IdGenerator, SequenceId};
pub use snapshot::{Snapshot, payloads};
pub use stats::BufferStats;
