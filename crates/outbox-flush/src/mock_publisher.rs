//! In-memory publishers for testing
//!
//! Provides publishers that record what they were given and fail on demand,
//! so flush behaviour can be exercised without a real collector.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use outbox_flush::{FlakyPublisher, RecordingPublisher};
//!
//! let recorder = RecordingPublisher::<String>::new();
//! recorder.set_failing(true); // every publish now returns Unavailable
//!
//! // Fail every third attempt of an otherwise healthy publisher
//! let flaky = FlakyPublisher::new(RecordingPublisher::<String>::new(), 3);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::PublishError;
use crate::publisher::Publisher;

/// Publisher that keeps every accepted batch in memory
#[derive(Debug)]
pub struct RecordingPublisher<T> {
    batches: Mutex<Vec<Vec<T>>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
    delay: Option<Duration>,
}

impl<T> Default for RecordingPublisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordingPublisher<T> {
    /// Create a publisher that accepts everything
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep for `delay` inside every publish call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make subsequent publishes fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of publish calls seen, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of accepted batches
    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }
}

impl<T: Clone> RecordingPublisher<T> {
    /// Accepted batches in publish order
    pub fn batches(&self) -> Vec<Vec<T>> {
        self.batches.lock().clone()
    }

    /// Every accepted event, flattened in publish order
    pub fn published(&self) -> Vec<T> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl<T> Publisher<T> for RecordingPublisher<T>
where
    T: Clone + Send + Sync,
{
    async fn publish(&self, events: &[&T]) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::unavailable("recording publisher set to fail"));
        }

        self.batches
            .lock()
            .push(events.iter().map(|event| (*event).clone()).collect());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Wraps a publisher and fails every `fail_every`-th attempt
#[derive(Debug)]
pub struct FlakyPublisher<P> {
    inner: P,
    fail_every: usize,
    attempts: AtomicUsize,
    failures: AtomicUsize,
}

impl<P> FlakyPublisher<P> {
    /// Fail attempts `fail_every`, `2 * fail_every`, ...; zero never fails
    pub fn new(inner: P, fail_every: usize) -> Self {
        Self {
            inner,
            fail_every,
            attempts: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// The wrapped publisher
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of injected failures so far
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T, P> Publisher<T> for FlakyPublisher<P>
where
    T: Send + Sync,
    P: Publisher<T>,
{
    async fn publish(&self, events: &[&T]) -> Result<(), PublishError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every > 0 && attempt % self.fail_every == 0 {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(PublishError::unavailable(format!(
                "injected failure on attempt {attempt}"
            )));
        }
        self.inner.publish(events).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}
