//! Background flush task
//!
//! Each cycle:
//! - Snapshot the buffer
//! - Publish the snapshot's payloads with no lock held
//! - On success, remove exactly the snapshotted events
//!
//! A failed or timed-out publish leaves the buffer untouched, so the same
//! events are offered again on the next cycle (at-least-once delivery).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use outbox_core::{EventBuffer, SequenceId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::FlushConfig;
use crate::error::{FlushError, PublishError};
use crate::publisher::Publisher;

/// Result of a single flush cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The buffer was empty; nothing was published
    Empty,
    /// The snapshot was published and removed from the buffer
    Published {
        /// Events handed to the publisher
        sent: usize,
        /// Events actually removed (fewer than `sent` if some were evicted meanwhile)
        removed: usize,
        /// Oldest id in the batch
        first_id: SequenceId,
        /// Newest id in the batch
        last_id: SequenceId,
    },
    /// Publishing failed; the events stay buffered for the next cycle
    Failed {
        /// Events in the rejected batch
        attempted: usize,
        /// Why the publish failed
        error: PublishError,
    },
}

impl FlushOutcome {
    /// Whether the cycle ended in a successful publish
    pub fn is_published(&self) -> bool {
        matches!(self, FlushOutcome::Published { .. })
    }
}

/// Cumulative flusher counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlushStats {
    /// Flush cycles run, including empty ones
    pub cycles: u64,
    /// Successful publishes
    pub published_batches: u64,
    /// Failed or timed-out publishes
    pub failed_batches: u64,
    /// Events handed to successful publishes
    pub events_sent: u64,
    /// Events removed from the buffer after successful publishes
    pub events_removed: u64,
}

#[derive(Debug, Default)]
struct FlushCounters {
    cycles: AtomicU64,
    published_batches: AtomicU64,
    failed_batches: AtomicU64,
    events_sent: AtomicU64,
    events_removed: AtomicU64,
}

impl FlushCounters {
    fn snapshot(&self) -> FlushStats {
        FlushStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            published_batches: self.published_batches.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_removed: self.events_removed.load(Ordering::Relaxed),
        }
    }
}

/// Periodically drains an [`EventBuffer`] into a [`Publisher`]
pub struct Flusher<T, P> {
    /// Buffer shared with producers
    buffer: Arc<EventBuffer<T>>,
    /// Where batches go
    publisher: Arc<P>,
    /// Interval and timeout settings
    config: FlushConfig,
    /// Shutdown signal
    shutdown_rx: broadcast::Receiver<()>,
    /// Counters shared with the handle
    counters: Arc<FlushCounters>,
}

impl<T, P> Flusher<T, P>
where
    T: Send + Sync + 'static,
    P: Publisher<T> + 'static,
{
    /// Create a new flusher
    pub fn new(
        buffer: Arc<EventBuffer<T>>,
        publisher: Arc<P>,
        config: FlushConfig,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Self, FlushError> {
        config.validate()?;
        Ok(Self {
            buffer,
            publisher,
            config,
            shutdown_rx,
            counters: Arc::new(FlushCounters::default()),
        })
    }

    /// Spawn a flusher as a background task
    pub fn spawn(
        buffer: Arc<EventBuffer<T>>,
        publisher: Arc<P>,
        config: FlushConfig,
    ) -> Result<FlusherHandle, FlushError> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let flusher = Self::new(buffer, publisher, config, shutdown_rx)?;
        let counters = Arc::clone(&flusher.counters);

        let task = tokio::spawn(async move { flusher.run().await });

        Ok(FlusherHandle {
            shutdown_tx,
            task,
            counters,
        })
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> FlushStats {
        self.counters.snapshot()
    }

    /// Run one snapshot, publish, remove cycle
    pub async fn flush_once(&self) -> FlushOutcome {
        self.counters.cycles.fetch_add(1, Ordering::Relaxed);

        let snapshot = self.buffer.snapshot();
        let (Some(first_id), Some(last_id)) = (snapshot.first_id(), snapshot.last_id()) else {
            return FlushOutcome::Empty;
        };

        let events = snapshot.payloads();
        let result = match self.config.publish_timeout() {
            Some(limit) => {
                match tokio::time::timeout(limit, self.publisher.publish(&events)).await {
                    Ok(result) => result,
                    Err(_) => Err(PublishError::Timeout(limit)),
                }
            }
            None => self.publisher.publish(&events).await,
        };

        match result {
            Ok(()) => {
                let removed = self.buffer.remove(&snapshot);
                self.counters.published_batches.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .events_sent
                    .fetch_add(events.len() as u64, Ordering::Relaxed);
                self.counters
                    .events_removed
                    .fetch_add(removed as u64, Ordering::Relaxed);

                debug!(
                    publisher = self.publisher.name(),
                    sent = events.len(),
                    removed,
                    first = %first_id,
                    last = %last_id,
                    "Published batch"
                );

                FlushOutcome::Published {
                    sent: events.len(),
                    removed,
                    first_id,
                    last_id,
                }
            }
            Err(error) => {
                self.counters.failed_batches.fetch_add(1, Ordering::Relaxed);
                warn!(
                    publisher = self.publisher.name(),
                    attempted = events.len(),
                    error = %error,
                    "Publish failed, events kept for next cycle"
                );

                FlushOutcome::Failed {
                    attempted: events.len(),
                    error,
                }
            }
        }
    }

    /// Run the flush loop until shutdown is signalled
    pub async fn run(mut self) -> FlushStats {
        info!(
            interval_ms = self.config.interval_ms,
            publisher = self.publisher.name(),
            "Flusher started"
        );

        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Flusher shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.flush_once().await;
                }
            }
        }

        if self.config.flush_on_shutdown {
            let outcome = self.flush_once().await;
            debug!(?outcome, "Final flush");
        }

        let stats = self.stats();
        info!(
            cycles = stats.cycles,
            published = stats.published_batches,
            failed = stats.failed_batches,
            events_sent = stats.events_sent,
            "Flusher stopped"
        );
        stats
    }
}

/// Handle to a spawned [`Flusher`]
#[derive(Debug)]
pub struct FlusherHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<FlushStats>,
    counters: Arc<FlushCounters>,
}

impl FlusherHandle {
    /// Counters accumulated so far
    pub fn stats(&self) -> FlushStats {
        self.counters.snapshot()
    }

    /// Whether the background task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the task (and its final flush) to finish
    pub async fn shutdown(self) -> Result<FlushStats, FlushError> {
        // The task may already be gone; joining reports why
        let _ = self.shutdown_tx.send(());
        Ok(self.task.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_publisher::RecordingPublisher;
    use std::time::Duration;

    fn setup(
        capacity: usize,
        config: FlushConfig,
    ) -> (
        Arc<EventBuffer<u32>>,
        Arc<RecordingPublisher<u32>>,
        Flusher<u32, RecordingPublisher<u32>>,
        broadcast::Sender<()>,
    ) {
        let buffer = Arc::new(EventBuffer::new(capacity).unwrap());
        let publisher = Arc::new(RecordingPublisher::new());
        let (tx, rx) = broadcast::channel(1);
        let flusher =
            Flusher::new(Arc::clone(&buffer), Arc::clone(&publisher), config, rx).unwrap();
        (buffer, publisher, flusher, tx)
    }

    #[tokio::test]
    async fn test_flush_empty_buffer() {
        let (_buffer, publisher, flusher, _tx) = setup(4, FlushConfig::default());
        assert_eq!(flusher.flush_once().await, FlushOutcome::Empty);
        assert_eq!(publisher.attempts(), 0);
        assert_eq!(flusher.stats().cycles, 1);
    }

    #[tokio::test]
    async fn test_flush_publishes_and_removes() {
        let (buffer, publisher, flusher, _tx) = setup(8, FlushConfig::default());
        for i in 1..=3 {
            buffer.append(i);
        }

        let outcome = flusher.flush_once().await;
        assert_eq!(
            outcome,
            FlushOutcome::Published {
                sent: 3,
                removed: 3,
                first_id: SequenceId::new(1),
                last_id: SequenceId::new(3),
            }
        );
        assert!(buffer.is_empty());
        assert_eq!(publisher.batches(), vec![vec![1, 2, 3]]);

        let stats = flusher.stats();
        assert_eq!(stats.published_batches, 1);
        assert_eq!(stats.events_sent, 3);
        assert_eq!(stats.events_removed, 3);
    }

    #[tokio::test]
    async fn test_failed_publish_keeps_events() {
        let (buffer, publisher, flusher, _tx) = setup(8, FlushConfig::default());
        buffer.append(1);
        buffer.append(2);
        publisher.set_failing(true);

        let outcome = flusher.flush_once().await;
        assert!(matches!(outcome, FlushOutcome::Failed { attempted: 2, .. }));
        assert_eq!(buffer.len(), 2);

        publisher.set_failing(false);
        buffer.append(3);
        assert!(flusher.flush_once().await.is_published());
        assert_eq!(publisher.published(), vec![1, 2, 3]);
        assert!(buffer.is_empty());
        assert_eq!(flusher.stats().failed_batches, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_timeout_counts_as_failure() {
        let buffer = Arc::new(EventBuffer::<u32>::new(4).unwrap());
        let publisher =
            Arc::new(RecordingPublisher::<u32>::new().with_delay(Duration::from_secs(5)));
        let (_tx, rx) = broadcast::channel(1);
        let config = FlushConfig::default().with_publish_timeout(Some(Duration::from_secs(1)));
        let flusher = Flusher::new(Arc::clone(&buffer), publisher, config, rx).unwrap();

        buffer.append(9);
        let outcome = flusher.flush_once().await;
        assert_eq!(
            outcome,
            FlushOutcome::Failed {
                attempted: 1,
                error: PublishError::Timeout(Duration::from_secs(1)),
            }
        );
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let buffer = Arc::new(EventBuffer::<u32>::new(4).unwrap());
        let publisher = Arc::new(RecordingPublisher::<u32>::new());
        let (_tx, rx) = broadcast::channel(1);
        let result = Flusher::new(
            buffer,
            publisher,
            FlushConfig::with_interval(Duration::ZERO),
            rx,
        );
        assert!(matches!(result, Err(FlushError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_flusher_drains_on_interval() {
        let buffer = Arc::new(EventBuffer::<u32>::new(16).unwrap());
        let publisher = Arc::new(RecordingPublisher::<u32>::new());
        let config = FlushConfig::with_interval(Duration::from_millis(100))
            .with_flush_on_shutdown(false);
        let handle =
            Flusher::spawn(Arc::clone(&buffer), Arc::clone(&publisher), config).unwrap();

        for i in 0..5 {
            buffer.append(i);
        }
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(buffer.is_empty());
        assert_eq!(publisher.published(), vec![0, 1, 2, 3, 4]);

        let stats = handle.shutdown().await.unwrap();
        assert!(stats.cycles >= 2);
        assert_eq!(stats.events_sent, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_runs_final_flush() {
        let buffer = Arc::new(EventBuffer::<u32>::new(16).unwrap());
        let publisher = Arc::new(RecordingPublisher::<u32>::new());
        let config = FlushConfig::with_interval(Duration::from_secs(3600));
        let handle =
            Flusher::spawn(Arc::clone(&buffer), Arc::clone(&publisher), config).unwrap();

        // Let the immediate first tick pass on an empty buffer
        tokio::time::sleep(Duration::from_millis(10)).await;
        buffer.append(42);

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(publisher.published(), vec![42]);
        assert!(buffer.is_empty());
        assert_eq!(stats.published_batches, 1);
    }
}
