//! Logging setup for volume-ctrl
//!
//! The terminal overlay owns the screen, so formatted logs go to a file while
//! it is active. Log lines can additionally be forwarded to a log relay.

use log_relay::client::RelayLayer;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

pub const LOG_MODE_ENV: &str = "VOLUME_CTRL_LOG_MODE";
pub const LOG_LEVEL_ENV: &str = "VOLUME_CTRL_LOG_LEVEL";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No formatted output
    Silent,
    /// Compact single-line output
    Development,
    /// Verbose diagnostics with source locations
    Debug,
}

impl LoggingMode {
    /// Parse a `VOLUME_CTRL_LOG_MODE` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(LoggingMode::Silent),
            "development" => Some(LoggingMode::Development),
            "debug" => Some(LoggingMode::Debug),
            _ => None,
        }
    }

    fn default_level(self) -> &'static str {
        match self {
            LoggingMode::Debug => "debug",
            LoggingMode::Silent | LoggingMode::Development => "info",
        }
    }
}

/// Mode from `VOLUME_CTRL_LOG_MODE`, or `default`.
pub fn mode_from_env(default: LoggingMode) -> LoggingMode {
    std::env::var(LOG_MODE_ENV)
        .ok()
        .and_then(|value| LoggingMode::parse(&value))
        .unwrap_or(default)
}

/// Where formatted log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// Appended to, created if missing
    File(PathBuf),
}

impl LogOutput {
    fn make_writer(&self) -> Result<BoxMakeWriter, LoggingError> {
        match self {
            LogOutput::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
            LogOutput::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| LoggingError::LogFile(path.clone(), e))?;
                Ok(BoxMakeWriter::new(std::sync::Mutex::new(file)))
            }
        }
    }

    fn ansi(&self) -> bool {
        matches!(self, LogOutput::Stderr)
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Failed to open log file {0}: {1}")]
    LogFile(PathBuf, #[source] std::io::Error),
}

pub struct LoggingConfig {
    pub mode: LoggingMode,
    pub output: LogOutput,
    /// Filter directive taking precedence over the environment
    pub level: Option<String>,
    pub relay: Option<RelayLayer>,
}

/// Install the global subscriber.
///
/// Filter precedence: `level`, then `VOLUME_CTRL_LOG_LEVEL`, then
/// `RUST_LOG`, then the mode's default. Silent mode without a relay installs
/// nothing.
pub fn init_logging(config: LoggingConfig) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer: Option<Box<dyn Layer<Registry> + Send + Sync>> = match config.mode {
        LoggingMode::Silent => None,
        LoggingMode::Development => Some(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(config.output.ansi())
                .with_writer(config.output.make_writer()?)
                .compact()
                .boxed(),
        ),
        LoggingMode::Debug => Some(
            fmt::layer()
                .pretty()
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(config.output.ansi())
                .with_writer(config.output.make_writer()?)
                .boxed(),
        ),
    };

    if fmt_layer.is_none() && config.relay.is_none() {
        return Ok(());
    }

    let directive = filter_directive(
        config.level,
        std::env::var(LOG_LEVEL_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        config.mode.default_level(),
    );

    Registry::default()
        .with(fmt_layer)
        .with(config.relay)
        .with(EnvFilter::new(directive))
        .try_init()
        .map_err(|e| LoggingError::TracingInit(e.to_string()))
}

fn filter_directive(
    explicit: Option<String>,
    level_env: Option<String>,
    rust_log: Option<String>,
    default_level: &str,
) -> String {
    explicit
        .or(level_env)
        .or(rust_log)
        .unwrap_or_else(|| default_level.to_string())
}

/// Most verbose level a relay should forward for a filter directive.
///
/// Only a bare level such as `debug` is honoured; anything else forwards
/// `INFO` and above.
pub fn relay_level(directive: Option<&str>) -> Level {
    directive
        .and_then(|d| d.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}
