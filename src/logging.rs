//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job. [`init`] builds a registry with an [`EnvFilter`] and one fmt
//! layer in the chosen [`OutputFormat`]. `RUST_LOG`, when set, takes precedence
//! over the configured level.
//!
//! # Example
//! ```no_run
//! use vibration_rss::{config::AnalysisConfig, logging};
//! use tracing::info;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig::load()?;
//! logging::init_from_config(&config)?;
//! info!("analysis started");
//! # Ok(())
//! # }
//! ```

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::Registry,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log levels accepted in configuration.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-line, coloured (interactive use)
    #[default]
    Pretty,
    /// Single-line, no colours
    Compact,
    /// One JSON object per event (log aggregation)
    Json,
}

/// Subscriber options.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Maximum level emitted.
    pub level: Level,
    /// Output layout.
    pub format: OutputFormat,
    /// Emit span NEW/CLOSE events
    pub with_span_events: bool,
    /// Include source file and line
    pub with_file_and_line: bool,
    /// ANSI colours (Pretty only)
    pub with_ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Pretty,
            with_span_events: false,
            with_file_and_line: false,
            with_ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Defaults at the given level.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Level and format from the `[application]` section.
    pub fn from_config(config: &AnalysisConfig) -> AppResult<Self> {
        Ok(Self {
            level: parse_log_level(&config.application.log_level)?,
            format: config.application.log_format,
            ..Default::default()
        })
    }

    /// Sets the output layout.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Toggles span NEW/CLOSE events.
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// Toggles ANSI colours.
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }
}

/// Initializes logging from the analysis configuration.
pub fn init_from_config(config: &AnalysisConfig) -> AppResult<()> {
    init(LoggingConfig::from_config(config)?)
}

/// Installs the global subscriber. Events are written to stderr so that
/// stdout stays free for command output.
///
/// Idempotent: if a global subscriber is already installed (tests, embedding
/// applications) this returns `Ok(())`.
pub fn init(config: LoggingConfig) -> AppResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.format {
        OutputFormat::Pretty => install(
            fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .with_file(config.with_file_and_line)
                .with_line_number(config.with_file_and_line)
                .with_ansi(config.with_ansi)
                .with_filter(env_filter),
        ),
        OutputFormat::Compact => install(
            fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .with_file(config.with_file_and_line)
                .with_line_number(config.with_file_and_line)
                .with_ansi(false)
                .with_filter(env_filter),
        ),
        OutputFormat::Json => install(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .with_file(config.with_file_and_line)
                .with_line_number(config.with_file_and_line)
                .with_filter(env_filter),
        ),
    }
}

fn install<L>(layer: L) -> AppResult<()>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .or_else(|e| {
            // expected in tests and when an embedding application got there first
            if e.to_string().contains("has already been set") {
                Ok(())
            } else {
                Err(AnalysisError::Configuration(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        })
}

/// Parses a case-insensitive level name.
pub fn parse_log_level(level: &str) -> AppResult<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(AnalysisError::Configuration(format!(
            "Invalid log_level '{}'. Must be one of: {}",
            level,
            LOG_LEVELS.join(", ")
        ))),
    }
}
