//! Structured logging setup for outbox services
//!
//! Installs a global `tracing` subscriber with console and/or file output.
//! Events from the outbox crates are filtered at [`LogConfig::level`]; all
//! other targets are held at [`LogConfig::other_level`] so runtime noise stays
//! out of the flusher's logs. `RUST_LOG` replaces both when set.
//!
//! # Quick Start
//!
//! ```ignore
//! use outbox_logging::{LogConfig, OutboxSubscriberBuilder};
//!
//! // JSONL to console, outbox crates at info
//! let _guard = OutboxSubscriberBuilder::new().init();
//!
//! // Daily rotated JSONL files, keep the guard alive until exit
//! let _guard = OutboxSubscriberBuilder::new()
//!     .with_config(LogConfig::production("./logs".into()))
//!     .init();
//! ```

pub mod config;

pub use config::{ConsoleFormat, FileConfig, LogConfig, OUTBOX_TARGETS, RotationStrategy};
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Errors from installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed
    #[error("Failed to install subscriber: {0}")]
    Init(#[from] TryInitError),

    /// The log file or directory could not be created
    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for configuring and initializing the logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable pretty output during development.
pub struct OutboxSubscriberBuilder {
    config: LogConfig,
}

impl OutboxSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the level for the outbox crates
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Set the console format, `None` disables console output
    pub fn with_console(mut self, format: Option<ConsoleFormat>) -> Self {
        self.config.console = format;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Initialize the subscriber globally
    ///
    /// Returns a guard that must be kept alive for the duration of the
    /// program when file output is enabled. Failures are reported on stderr
    /// and leave any existing subscriber in place.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns an error if a global subscriber has already been set or the
    /// log file cannot be created.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.filter_directive()));
        let location = self.config.include_location;

        let pretty_console = match self.config.console {
            Some(ConsoleFormat::Pretty { ansi }) => {
                Some(fmt::layer().with_ansi(ansi).with_target(true))
            }
            _ => None,
        };

        let jsonl_console = matches!(self.config.console, Some(ConsoleFormat::Json)).then(|| {
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_file(location)
                .with_line_number(location)
        });

        let (file_layer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = create_file_writer(file_config)?;
                let layer = fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_file(location)
                    .with_line_number(location)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(pretty_console)
            .with(jsonl_console)
            .with(file_layer)
            .try_init()?;

        tracing::debug!(
            level = %self.config.level,
            file = self.config.file.is_some(),
            "Logging initialized"
        );
        Ok(guard)
    }
}

impl Default for OutboxSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a non-blocking file writer
///
/// `Never` truncates `<prefix>.log`; `Daily` appends to the current day's file.
fn create_file_writer(
    file_config: &FileConfig,
) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&file_config.directory)?;

    let writer = match file_config.rotation {
        RotationStrategy::Never => {
            let file_path = file_config
                .directory
                .join(format!("{}.log", file_config.prefix));
            tracing_appender::non_blocking(File::create(file_path)?)
        }
        RotationStrategy::Daily => tracing_appender::non_blocking(RollingFileAppender::new(
            Rotation::DAILY,
            &file_config.directory,
            &file_config.prefix,
        )),
    };

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = OutboxSubscriberBuilder::new();
        assert_eq!(builder.config, LogConfig::default());
    }

    #[test]
    fn test_builder_with_config() {
        let builder = OutboxSubscriberBuilder::new().with_config(LogConfig::development());
        assert_eq!(builder.config.level, "debug");
        assert!(matches!(builder.config.console, Some(ConsoleFormat::Pretty { .. })));
    }

    #[test]
    fn test_builder_with_level_and_console() {
        let builder = OutboxSubscriberBuilder::new()
            .with_level("trace")
            .with_console(None);
        assert_eq!(builder.config.level, "trace");
        assert!(builder.config.console.is_none());
        assert!(builder.config.filter_directive().contains("outbox_core=trace"));
    }

    // The only test that installs the global subscriber
    #[test]
    fn test_try_init_writes_file_and_rejects_second_install() {
        let dir = tempfile::tempdir().unwrap();
        let file_config = FileConfig {
            directory: dir.path().join("nested"),
            prefix: "test".to_string(),
            rotation: RotationStrategy::Never,
        };

        let guard = OutboxSubscriberBuilder::new()
            .with_console(None)
            .with_file_output(file_config)
            .try_init()
            .unwrap();
        assert!(guard.is_some());
        assert!(dir.path().join("nested").join("test.log").exists());

        let second = OutboxSubscriberBuilder::new().with_console(None).try_init();
        assert!(matches!(second, Err(LoggingError::Init(_))));
    }
}
