//! Outbox simulation - binary entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use outbox_logging::{LogConfig, OutboxSubscriberBuilder};

use outbox_simulation::{SimulationConfig, Workload, scenarios};

#[derive(Parser)]
#[command(
    name = "outbox-sim",
    about = "Producer/flusher simulation for the outbox event buffer",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Human-readable log output instead of JSONL
    #[arg(long, global = true)]
    pretty: bool,

    /// Write JSONL logs to daily files in this directory instead of the console
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// JSON file with `buffer` and `flush` settings
    ///
    /// Without it, settings come from OUTBOX_CAPACITY, OUTBOX_FLUSH_INTERVAL_MS
    /// and OUTBOX_PUBLISH_TIMEOUT_MS.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through one append, snapshot, publish, remove cycle
    Cycle,

    /// Run concurrent producers against a periodically flushing publisher
    Run {
        /// Number of producer tasks
        #[arg(short, long, default_value = "4")]
        producers: usize,

        /// Events appended by each producer
        #[arg(short, long, default_value = "250")]
        events: usize,

        /// Buffer capacity (overrides the config file)
        #[arg(long)]
        capacity: Option<usize>,

        /// Flush interval in milliseconds (overrides the config file)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Maximum random pause between appends, in milliseconds
        #[arg(long, default_value = "2")]
        max_pause_ms: u64,

        /// Fail every N-th publish attempt (0 = never)
        #[arg(long, default_value = "3")]
        fail_every: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = match (&cli.log_dir, cli.pretty) {
        (Some(dir), _) => LogConfig::production(dir.clone()),
        (None, true) => LogConfig::development(),
        (None, false) => LogConfig::default(),
    };
    let level = if cli.verbose { "debug" } else { "info" };
    let _guard = OutboxSubscriberBuilder::new()
        .with_config(log_config)
        .with_level(level)
        .init();

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::from_env()?,
    };

    match cli.command {
        Commands::Cycle => {
            scenarios::run_cycle_scenario()?;
        }
        Commands::Run {
            producers,
            events,
            capacity,
            interval_ms,
            max_pause_ms,
            fail_every,
        } => {
            if let Some(capacity) = capacity {
                config.buffer.capacity = capacity;
            }
            if let Some(interval_ms) = interval_ms {
                config.flush.interval_ms = interval_ms;
            }

            let workload = Workload {
                producers,
                events_per_producer: events,
                max_pause_ms,
                fail_every,
            };

            let report = scenarios::run_producer_scenario(&config, &workload).await?;
            println!("\n{}", report);
        }
    }

    Ok(())
}
