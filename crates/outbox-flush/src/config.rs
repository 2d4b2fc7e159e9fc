//! Flusher configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FlushError;

/// Environment variable for the flush interval in milliseconds
pub const FLUSH_INTERVAL_ENV: &str = "OUTBOX_FLUSH_INTERVAL_MS";

/// Environment variable for the publish timeout in milliseconds (0 disables)
pub const PUBLISH_TIMEOUT_ENV: &str = "OUTBOX_PUBLISH_TIMEOUT_MS";

/// Configuration for a [`Flusher`](crate::Flusher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    /// Time between flush cycles
    pub interval_ms: u64,
    /// Upper bound on a single publish call; `None` waits indefinitely
    pub publish_timeout_ms: Option<u64>,
    /// Run one last flush when shutting down
    pub flush_on_shutdown: bool,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            publish_timeout_ms: Some(10_000),
            flush_on_shutdown: true,
        }
    }
}

impl FlushConfig {
    /// Create a config flushing every `interval`
    ///
    /// Settings have millisecond resolution; a non-zero sub-millisecond
    /// remainder rounds up.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval_ms: ceil_millis(interval),
            ..Default::default()
        }
    }

    /// Set the publish timeout
    pub fn with_publish_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.publish_timeout_ms = timeout.map(ceil_millis);
        self
    }

    /// Enable or disable the final flush on shutdown
    pub fn with_flush_on_shutdown(mut self, enabled: bool) -> Self {
        self.flush_on_shutdown = enabled;
        self
    }

    /// Time between flush cycles
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Upper bound on a single publish call
    pub fn publish_timeout(&self) -> Option<Duration> {
        self.publish_timeout_ms.map(Duration::from_millis)
    }

    /// Check the configuration
    pub fn validate(&self) -> Result<(), FlushError> {
        if self.interval_ms == 0 {
            return Err(FlushError::InvalidConfig(
                "flush interval must be greater than zero".to_string(),
            ));
        }
        if self.publish_timeout_ms == Some(0) {
            return Err(FlushError::InvalidConfig(
                "publish timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the configuration from the environment
    ///
    /// Unset variables keep their defaults. A timeout of `0` disables it.
    pub fn from_env() -> Result<Self, FlushError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup` instead of the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FlushError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(FLUSH_INTERVAL_ENV) {
            config.interval_ms = parse_millis(FLUSH_INTERVAL_ENV, &raw)?;
        }
        if let Some(raw) = lookup(PUBLISH_TIMEOUT_ENV) {
            config.publish_timeout_ms = match parse_millis(PUBLISH_TIMEOUT_ENV, &raw)? {
                0 => None,
                ms => Some(ms),
            };
        }

        config.validate()?;
        Ok(config)
    }
}

/// Whole milliseconds, rounding any sub-millisecond remainder up
fn ceil_millis(duration: Duration) -> u64 {
    let mut millis = duration.as_millis();
    if duration.subsec_nanos() % 1_000_000 != 0 {
        millis += 1;
    }
    u64::try_from(millis).unwrap_or(u64::MAX)
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, FlushError> {
    raw.trim().parse().map_err(|_| {
        FlushError::InvalidConfig(format!("{key}={raw} is not a number of milliseconds"))
    })
}
