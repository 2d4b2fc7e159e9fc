//! Error types for outbox-core
//!
//! Buffer operations themselves never fail. The only errors are
//! configuration errors surfaced once, at construction time.

use thiserror::Error;

/// Errors raised while configuring an [`EventBuffer`](crate::EventBuffer)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Capacity must be at least one entry
    #[error("Invalid buffer capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// A configuration value could not be interpreted
    #[error("Invalid buffer configuration: {0}")]
    InvalidConfig(String),
}

impl BufferError {
    /// Create a new InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
