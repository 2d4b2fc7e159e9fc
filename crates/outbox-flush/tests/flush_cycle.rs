//! End-to-end flush cycle tests
//!
//! Producers and a flusher share one buffer; these tests check what reaches
//! the publisher and what is left behind.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use outbox_core::{EventBuffer, SequenceId};
use outbox_flush::{
    FlakyPublisher, FlushConfig, FlushOutcome, Flusher, PublishError, Publisher,
    RecordingPublisher,
};
use tokio::sync::broadcast;

/// Publisher that appends to the buffer while "on the wire"
struct InterleavingPublisher {
    buffer: Arc<EventBuffer<u32>>,
    arrivals: Vec<u32>,
    inner: RecordingPublisher<u32>,
}

#[async_trait::async_trait]
impl Publisher<u32> for InterleavingPublisher {
    async fn publish(&self, events: &[&u32]) -> Result<(), PublishError> {
        for value in &self.arrivals {
            self.buffer.append(*value);
        }
        tokio::task::yield_now().await;
        self.inner.publish(events).await
    }
}

fn contents(buffer: &EventBuffer<u32>) -> Vec<(u64, u32)> {
    buffer
        .snapshot()
        .entries()
        .map(|entry| (entry.id().get(), *entry.payload()))
        .collect()
}

/// Events appended during a publish survive its removal step
#[tokio::test]
async fn test_appends_during_publish_survive() {
    let buffer = Arc::new(EventBuffer::new(5).unwrap());
    for i in 1..=10 {
        buffer.append(i);
    }

    let publisher = Arc::new(InterleavingPublisher {
        buffer: Arc::clone(&buffer),
        arrivals: vec![11, 12],
        inner: RecordingPublisher::new(),
    });
    let (_tx, rx) = broadcast::channel(1);
    let flusher = Flusher::new(
        Arc::clone(&buffer),
        Arc::clone(&publisher),
        FlushConfig::default(),
        rx,
    )
    .unwrap();

    let outcome = flusher.flush_once().await;

    // 11 and 12 evicted ids 6 and 7 before the publish returned
    assert_eq!(
        outcome,
        FlushOutcome::Published {
            sent: 5,
            removed: 3,
            first_id: SequenceId::new(6),
            last_id: SequenceId::new(10),
        }
    );
    assert_eq!(publisher.inner.published(), vec![6, 7, 8, 9, 10]);
    assert_eq!(contents(&buffer), vec![(11, 11), (12, 12)]);
}

/// Without eviction, only the events appended mid-publish remain
#[tokio::test]
async fn test_conditional_removal_keeps_new_arrivals() {
    let buffer = Arc::new(EventBuffer::new(100).unwrap());
    for i in 1..=4 {
        buffer.append(i);
    }

    let publisher = Arc::new(InterleavingPublisher {
        buffer: Arc::clone(&buffer),
        arrivals: vec![50, 51, 52],
        inner: RecordingPublisher::new(),
    });
    let (_tx, rx) = broadcast::channel(1);
    let flusher =
        Flusher::new(Arc::clone(&buffer), publisher, FlushConfig::default(), rx).unwrap();

    assert!(flusher.flush_once().await.is_published());
    assert_eq!(contents(&buffer), vec![(5, 50), (6, 51), (7, 52)]);
}

/// Repeated failures never lose data; every event is eventually delivered
#[tokio::test(start_paused = true)]
async fn test_flaky_publisher_delivers_at_least_once() {
    let buffer = Arc::new(EventBuffer::<u32>::new(10_000).unwrap());
    let publisher = Arc::new(FlakyPublisher::new(RecordingPublisher::<u32>::new(), 2));
    let config = FlushConfig::with_interval(Duration::from_millis(10));
    let handle = Flusher::spawn(Arc::clone(&buffer), Arc::clone(&publisher), config).unwrap();

    let producers: Vec<_> = (0..4u32)
        .map(|producer| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                for n in 0..250u32 {
                    buffer.append(producer * 1_000 + n);
                    if n % 25 == 0 {
                        tokio::time::sleep(Duration::from_millis(3)).await;
                    }
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    // Give the flusher enough cycles to get past injected failures
    tokio::time::sleep(Duration::from_millis(100)).await;
    let stats = handle.shutdown().await.unwrap();

    assert!(buffer.is_empty());
    assert!(publisher.failures() > 0);
    assert!(stats.failed_batches > 0);

    let delivered: HashSet<u32> = publisher.inner().published().into_iter().collect();
    assert_eq!(delivered.len(), 1_000);
    for producer in 0..4u32 {
        for n in 0..250u32 {
            assert!(delivered.contains(&(producer * 1_000 + n)));
        }
    }
}

/// A healthy publisher sees every event exactly once, in id order
#[tokio::test(start_paused = true)]
async fn test_healthy_publisher_exactly_once_in_order() {
    let buffer = Arc::new(EventBuffer::<u32>::new(10_000).unwrap());
    let publisher = Arc::new(RecordingPublisher::<u32>::new());
    let config = FlushConfig::with_interval(Duration::from_millis(5));
    let handle = Flusher::spawn(Arc::clone(&buffer), Arc::clone(&publisher), config).unwrap();

    for n in 0..500u32 {
        buffer.append(n);
        if n % 50 == 0 {
            tokio::time::sleep(Duration::from_millis(7)).await;
        }
    }

    let stats = handle.shutdown().await.unwrap();
    assert_eq!(publisher.published(), (0..500).collect::<Vec<_>>());
    assert_eq!(stats.events_sent, 500);
    assert_eq!(stats.events_removed, 500);
    assert!(buffer.is_empty());
}

/// A failing publisher leaves the buffer full and subject only to eviction
#[tokio::test]
async fn test_failing_publisher_leaves_buffer_intact() {
    let buffer = Arc::new(EventBuffer::<u32>::new(3).unwrap());
    let publisher = Arc::new(RecordingPublisher::<u32>::new());
    publisher.set_failing(true);
    let (_tx, rx) = broadcast::channel(1);
    let flusher = Flusher::new(
        Arc::clone(&buffer),
        Arc::clone(&publisher),
        FlushConfig::default(),
        rx,
    )
    .unwrap();

    for i in 1..=5 {
        buffer.append(i);
        let outcome = flusher.flush_once().await;
        assert!(matches!(outcome, FlushOutcome::Failed { .. }));
    }

    assert_eq!(contents(&buffer), vec![(3, 3), (4, 4), (5, 5)]);
    assert_eq!(publisher.attempts(), 5);
    assert_eq!(flusher.stats().failed_batches, 5);
}
