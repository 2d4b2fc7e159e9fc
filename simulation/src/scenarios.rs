//! Pre-defined simulation scenarios for the outbox buffer
//!
//! Includes the canonical append/snapshot/remove walk-through and a
//! concurrent producer run against a flaky publisher.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use outbox_core::{BufferError, EventBuffer};
use outbox_flush::{FlakyPublisher, FlushError, Flusher, RecordingPublisher};
use rand::Rng;
use tracing::info;

use crate::types::{RunReport, SimEvent, SimulationConfig, Workload};

/// Flush intervals to wait for the buffer to empty after producers stop
const DRAIN_CYCLES: usize = 10;

fn render(buffer: &EventBuffer<u32>) -> String {
    let entries: Vec<String> = buffer
        .snapshot()
        .entries()
        .map(|entry| format!("({}, e{})", entry.id().get(), entry.payload()))
        .collect();
    format!("[{}]", entries.join(", "))
}

/// Run the canonical full-cycle scenario:
///
/// ```text
/// Append events 1..10 into a capacity-5 buffer (events 1-5 are evicted)
/// Snapshot events 6-10
/// Events 11 and 12 arrive while the snapshot is being published
/// Publish succeeds, the snapshot is removed
/// Only events 11 and 12 remain
/// ```
pub fn run_cycle_scenario() -> Result<EventBuffer<u32>, BufferError> {
    info!("=== Running full cycle scenario ===");

    let buffer = EventBuffer::new(5)?;

    println!("\n--- Step 1: Append events 1..10 into capacity 5 ---");
    for i in 1..=10 {
        buffer.append(i);
    }
    println!("  buffer:   {}", render(&buffer));

    println!("\n--- Step 2: Snapshot ---");
    let snapshot = buffer.snapshot();
    let payloads: Vec<String> = snapshot.payloads().iter().map(|p| format!("e{p}")).collect();
    println!("  snapshot: [{}]", payloads.join(", "));

    println!("\n--- Step 3: Events 11 and 12 arrive during publish ---");
    buffer.append(11);
    buffer.append(12);
    println!("  buffer:   {}", render(&buffer));

    println!("\n--- Step 4: Publish succeeded, remove snapshot ---");
    let removed = buffer.remove(&snapshot);
    println!("  removed {} (ids 6 and 7 were already evicted)", removed);
    println!("  buffer:   {}", render(&buffer));

    let stats = buffer.stats();
    println!(
        "\n  appended={} evicted={} removed={} remaining={}",
        stats.appended, stats.evicted, stats.removed, stats.len
    );

    Ok(buffer)
}

/// Run concurrent producers against a flusher with injected publish failures
pub async fn run_producer_scenario(
    config: &SimulationConfig,
    workload: &Workload,
) -> Result<RunReport, FlushError> {
    info!(
        producers = workload.producers,
        events_per_producer = workload.events_per_producer,
        capacity = config.buffer.capacity,
        fail_every = workload.fail_every,
        "=== Running producer scenario ==="
    );

    let buffer = Arc::new(EventBuffer::<SimEvent>::from_config(&config.buffer)?);
    let publisher = Arc::new(FlakyPublisher::new(
        RecordingPublisher::<SimEvent>::new(),
        workload.fail_every,
    ));
    let handle = Flusher::spawn(Arc::clone(&buffer), Arc::clone(&publisher), config.flush.clone())?;

    let producers: Vec<_> = (0..workload.producers)
        .map(|producer| {
            let buffer = Arc::clone(&buffer);
            let events = workload.events_per_producer;
            let max_pause = workload.max_pause_ms;
            tokio::spawn(async move {
                for seq in 0..events {
                    buffer.append(SimEvent { producer, seq });
                    let pause = rand::rng().random_range(0..=max_pause);
                    if pause > 0 {
                        tokio::time::sleep(Duration::from_millis(pause)).await;
                    }
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await?;
    }
    info!("Producers finished");

    // Give the flusher a few cycles to drain what the producers left behind
    for _ in 0..DRAIN_CYCLES {
        if buffer.is_empty() {
            break;
        }
        tokio::time::sleep(config.flush.interval()).await;
    }

    let flush = handle.shutdown().await?;
    let delivered = publisher.inner().published();
    let delivered_unique: HashSet<SimEvent> = delivered.iter().copied().collect();
    let buffer_stats = buffer.stats();

    let appended = workload.producers * workload.events_per_producer;
    let report = RunReport {
        buffer: buffer_stats,
        flush,
        delivered: delivered.len(),
        delivered_unique: delivered_unique.len(),
        lost_to_eviction: appended - delivered_unique.len() - buffer_stats.len,
        injected_failures: publisher.failures(),
    };

    info!(
        delivered = report.delivered,
        unique = report.delivered_unique,
        lost = report.lost_to_eviction,
        "Producer scenario complete"
    );

    Ok(report)
}
