//! Publisher abstraction
//!
//! The flusher hands each snapshot's payloads to a [`Publisher`]. How the
//! events are serialized and transmitted is entirely up to the
//! implementation; the flusher only cares whether the whole batch was
//! accepted.

use async_trait::async_trait;

use crate::error::PublishError;

/// Transmits batches of events to a remote collector
///
/// `Ok(())` acknowledges every event in `events`. Any error, including a
/// partial send, acknowledges none of them and the batch is retried on the
/// next flush.
#[async_trait]
pub trait Publisher<T>: Send + Sync {
    /// Publish a batch, oldest event first
    async fn publish(&self, events: &[&T]) -> Result<(), PublishError>;

    /// Short name used in log output
    fn name(&self) -> &str {
        "publisher"
    }
}

