//! Configuration types for the logging system

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Crates whose events are governed by [`LogConfig::level`]
///
/// Everything else (tokio internals and other dependencies) is held at
/// [`LogConfig::other_level`].
pub const OUTBOX_TARGETS: &[&str] = &[
    "outbox_core",
    "outbox_flush",
    "outbox_simulation",
    "outbox_sim",
];

/// Main logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for the outbox crates (can be overridden by RUST_LOG)
    pub level: String,

    /// Level for every other target
    pub other_level: String,

    /// Console output format, `None` disables console output
    pub console: Option<ConsoleFormat>,

    /// JSONL file output
    pub file: Option<FileConfig>,

    /// Include file/line information in JSONL records
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            other_level: "warn".to_string(),
            console: Some(ConsoleFormat::Json),
            file: None,
            include_location: true,
        }
    }
}

impl LogConfig {
    /// Pretty console output with colors, outbox crates at `debug`
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            console: Some(ConsoleFormat::Pretty { ansi: true }),
            ..Default::default()
        }
    }

    /// JSONL to a daily rotated file under `log_dir`, console off
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            console: None,
            file: Some(FileConfig {
                directory: log_dir,
                ..FileConfig::default()
            }),
            ..Default::default()
        }
    }

    /// `EnvFilter` directive used when RUST_LOG is not set
    ///
    /// ```
    /// use outbox_logging::LogConfig;
    ///
    /// let directive = LogConfig::default().filter_directive();
    /// assert!(directive.starts_with("warn,"));
    /// assert!(directive.contains("outbox_flush=info"));
    /// ```
    pub fn filter_directive(&self) -> String {
        let mut directive = self.other_level.clone();
        for target in OUTBOX_TARGETS {
            directive.push_str(&format!(",{target}={}", self.level));
        }
        directive
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleFormat {
    /// One JSON object per line
    Json,
    /// Human-readable multi-field lines
    Pretty {
        /// Include ANSI colors
        ansi: bool,
    },
}

/// File output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Directory for log files
    pub directory: PathBuf,
    /// File name prefix
    pub prefix: String,
    /// Rotation strategy
    pub rotation: RotationStrategy,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "outbox".to_string(),
            rotation: RotationStrategy::Daily,
        }
    }
}

/// File rotation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationStrategy {
    /// New file per day, `<prefix>.YYYY-MM-DD`
    #[default]
    Daily,
    /// Single `<prefix>.log`, truncated on start
    Never,
}
