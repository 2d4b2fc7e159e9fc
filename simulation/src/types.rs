//! Simulation data types

use std::fmt;
use std::path::Path;

use outbox_core::{BufferConfig, BufferError, BufferStats};
use outbox_flush::{FlushConfig, FlushError, FlushStats};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event produced by a simulated producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimEvent {
    /// Producer index
    pub producer: usize,
    /// Per-producer sequence number
    pub seq: usize,
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}/{}", self.producer, self.seq)
    }
}

/// Errors loading simulation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`SimulationConfig`]
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A buffer setting from the environment was rejected
    #[error("Invalid buffer settings: {0}")]
    Buffer(#[from] BufferError),

    /// A flusher setting from the environment was rejected
    #[error("Invalid flush settings: {0}")]
    Flush(#[from] FlushError),
}

/// Buffer and flusher settings for a simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Event buffer settings
    pub buffer: BufferConfig,
    /// Flusher settings
    pub flush: FlushConfig,
}

impl SimulationConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Read `OUTBOX_CAPACITY`, `OUTBOX_FLUSH_INTERVAL_MS` and
    /// `OUTBOX_PUBLISH_TIMEOUT_MS`, keeping defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            buffer: BufferConfig::from_lookup(&lookup)?,
            flush: FlushConfig::from_lookup(&lookup)?,
        })
    }
}

/// Producer workload for a simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Concurrent producer tasks
    pub producers: usize,
    /// Events appended by each producer
    pub events_per_producer: usize,
    /// Upper bound on the random pause between appends, in milliseconds
    pub max_pause_ms: u64,
    /// Fail every N-th publish attempt (0 = never)
    pub fail_every: usize,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            producers: 4,
            events_per_producer: 250,
            max_pause_ms: 2,
            fail_every: 3,
        }
    }
}

/// What happened during a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Final buffer counters
    pub buffer: BufferStats,
    /// Final flusher counters
    pub flush: FlushStats,
    /// Events accepted by the publisher, duplicates included
    pub delivered: usize,
    /// Distinct events accepted by the publisher
    pub delivered_unique: usize,
    /// Events evicted before they could be published
    pub lost_to_eviction: usize,
    /// Injected publish failures
    pub injected_failures: usize,
}

impl RunReport {
    /// Events delivered more than once
    pub fn duplicates(&self) -> usize {
        self.delivered - self.delivered_unique
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "appended:          {}", self.buffer.appended)?;
        writeln!(f, "evicted:           {}", self.buffer.evicted)?;
        writeln!(f, "still buffered:    {}", self.buffer.len)?;
        writeln!(f, "flush cycles:      {}", self.flush.cycles)?;
        writeln!(f, "published batches: {}", self.flush.published_batches)?;
        writeln!(f, "failed batches:    {}", self.flush.failed_batches)?;
        writeln!(f, "injected failures: {}", self.injected_failures)?;
        writeln!(
            f,
            "delivered:         {} ({} unique, {} duplicates)",
            self.delivered,
            self.delivered_unique,
            self.duplicates()
        )?;
        write!(f, "lost to eviction:  {}", self.lost_to_eviction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sim_event_display() {
        let event = SimEvent { producer: 2, seq: 17 };
        assert_eq!(event.to_string(), "p2/17");
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"buffer": {"capacity": 32}, "flush": {"interval_ms": 20}}"#;
        file.write_all(json.as_bytes()).unwrap();

        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.buffer.capacity, 32);
        assert_eq!(config.flush.interval_ms, 20);
        assert!(config.flush.flush_on_shutdown);
    }

    #[test]
    fn test_from_lookup_reads_buffer_and_flush_settings() {
        let config = SimulationConfig::from_lookup(|key| match key {
            outbox_core::CAPACITY_ENV => Some("64".to_string()),
            outbox_flush::FLUSH_INTERVAL_ENV => Some("25".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.buffer.capacity, 64);
        assert_eq!(config.flush.interval_ms, 25);
        assert_eq!(config.flush.publish_timeout_ms, FlushConfig::default().publish_timeout_ms);

        let empty = SimulationConfig::from_lookup(|_| None).unwrap();
        assert_eq!(empty, SimulationConfig::default());

        let err = SimulationConfig::from_lookup(|key| {
            (key == outbox_core::CAPACITY_ENV).then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Buffer(BufferError::InvalidCapacity(0))));
    }

    #[test]
    fn test_load_config_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "capacity = 3").unwrap();
        assert!(matches!(
            SimulationConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
