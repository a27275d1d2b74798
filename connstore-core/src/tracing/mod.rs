//! Structured logging setup
//!
//! The library only emits `tracing` events. Applications embedding the store
//! call [`init_tracing`] once at startup to install a `tracing-subscriber`
//! formatter filtered to this crate.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Target used by the default filter
const CRATE_TARGET: &str = "connstore_core";

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// The subscriber could not be installed
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// The filter directive did not parse
    #[error("Invalid filter '{filter}': {reason}")]
    InvalidFilter {
        /// Directive as given
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A level name was not recognised
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    /// Tracing already initialized
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,

    /// The log file could not be opened
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        /// Log file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TracingLevel {
    /// Errors only
    Error,
    /// Errors and warnings
    Warn,
    /// Store lifecycle events (default)
    #[default]
    Info,
    /// Cache rebuilds, vault lookups and durable writes
    Debug,
    /// Everything
    Trace,
}

impl TracingLevel {
    /// Converts to the `tracing` crate's level
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(TracingError::UnknownLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard output
    Stdout,
    /// Standard error
    #[default]
    Stderr,
    /// A log file, appended to
    File(PathBuf),
}

/// Configuration for [`init_tracing`]
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Level for this crate's events
    pub level: TracingLevel,
    /// Output destination
    pub output: TracingOutput,
    /// Include thread ids in each line
    pub thread_ids: bool,
    /// Full `EnvFilter` directive; overrides `level`
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Creates a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output destination
    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Includes thread ids
    #[must_use]
    pub const fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Sets a custom filter directive
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Filter directive this configuration installs
    #[must_use]
    pub fn directive(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| format!("{CRATE_TARGET}={}", self.level))
    }

    fn env_filter(&self) -> TracingResult<EnvFilter> {
        let directive = self.directive();
        EnvFilter::try_new(&directive).map_err(|e| TracingError::InvalidFilter {
            filter: directive,
            reason: e.to_string(),
        })
    }

    fn writer(&self) -> TracingResult<(BoxMakeWriter, bool)> {
        Ok(match &self.output {
            TracingOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
            TracingOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
            TracingOutput::File(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent).map_err(|source| TracingError::LogFile {
                        path: path.clone(),
                        source,
                    })?;
                }
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| TracingError::LogFile {
                        path: path.clone(),
                        source,
                    })?;
                (BoxMakeWriter::new(file), false)
            }
        })
    }
}

/// Installs the global subscriber.
///
/// Call once at startup; later calls fail with
/// [`TracingError::AlreadyInitialized`].
///
/// # Errors
/// Returns an error if tracing was already initialized, the filter is invalid,
/// the log file cannot be opened, or another subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let result = install(config);
    if result.is_err() {
        TRACING_INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

fn install(config: &TracingConfig) -> TracingResult<()> {
    let filter = config.env_filter()?;
    let (writer, ansi) = config.writer()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(config.thread_ids)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::info!(directive = %config.directive(), "Tracing initialized");
    Ok(())
}

/// Checks if tracing has been initialized
#[must_use]
pub fn is_tracing_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::SeqCst)
}
