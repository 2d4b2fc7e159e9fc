//! Flusher and publisher error types

use std::time::Duration;

use outbox_core::BufferError;
use thiserror::Error;

/// Reasons a publish attempt can fail
///
/// A failure means nothing in the batch is acknowledged; partial delivery
/// must be reported as a failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    /// The collector refused the batch
    #[error("Batch rejected: {0}")]
    Rejected(String),

    /// The collector could not be reached
    #[error("Collector unavailable: {0}")]
    Unavailable(String),

    /// The publish call did not complete in time
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),
}

impl PublishError {
    /// Create a new Rejected error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Create a new Unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Errors from setting up or stopping a flusher
#[derive(Debug, Error)]
pub enum FlushError {
    /// Flusher configuration is unusable
    #[error("Invalid flush configuration: {0}")]
    InvalidConfig(String),

    /// Buffer configuration is unusable
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// The background task panicked or was cancelled
    #[error("Flusher task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
