//! Buffer configuration

use serde::{Deserialize, Serialize};

use crate::error::BufferError;

/// Environment variable consulted by [`BufferConfig::from_env`]
pub const CAPACITY_ENV: &str = "OUTBOX_CAPACITY";

/// Default number of entries held before the oldest is evicted
pub const DEFAULT_CAPACITY: usize = 1024;

/// Configuration for an [`EventBuffer`](crate::EventBuffer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum number of entries held at once
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl BufferConfig {
    /// Create a config with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Check the configuration
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.capacity == 0 {
            return Err(BufferError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }

    /// Read the configuration from the environment
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, BufferError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup` instead of the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BufferError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(CAPACITY_ENV) {
            config.capacity = raw.trim().parse().map_err(|_| {
                BufferError::invalid_config(format!("{CAPACITY_ENV}={raw} is not a valid capacity"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}
