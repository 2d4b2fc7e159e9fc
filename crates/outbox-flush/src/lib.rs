//! # Outbox Flush
//!
//! Drains an [`outbox_core::EventBuffer`] into a remote collector.
//!
//! The [`Flusher`] periodically snapshots the buffer, hands the payloads to
//! a [`Publisher`], and removes exactly the published events once the
//! publisher reports success. Nothing is locked while publishing, so
//! producers keep appending throughout.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use outbox_core::EventBuffer;
//! use outbox_flush::{FlushConfig, Flusher, RecordingPublisher};
//!
//! let buffer = Arc::new(EventBuffer::new(1024)?);
//! let publisher = Arc::new(RecordingPublisher::<String>::new());
//! let handle = Flusher::spawn(buffer.clone(), publisher, FlushConfig::default())?;
//!
//! buffer.append("login".to_string());
//!
//! let stats = handle.shutdown().await?;
//! ```

pub mod config;
pub mod error;
pub mod flusher;
pub mod mock_publisher;
pub mod publisher;

// Re-exports
pub use config::{FLUSH_INTERVAL_ENV, FlushConfig, PUBLISH_TIMEOUT_ENV};
pub use error::{FlushError, PublishError};
pub use flusher::{FlushOutcome, FlushStats, Flusher, FlusherHandle};
pub use mock_publisher::{FlakyPublisher, RecordingPublisher};
pub use publisher::Publisher;
