//! # Logging Utilities
//!
//! Logging infrastructure for svmprobe host adapters using `tracing`.
//!
//! The core crate only emits events; a host adapter (debugger bridge, test
//! harness) installs a subscriber with one of the functions here. Console
//! output goes to stderr, because the debugger's own output owns stdout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svmprobe_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("bridge loaded");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=svmprobe_core=trace`)
//! - `SVMPROBE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `SVMPROBE_LOG_FILE`: Optional path of an additional, daily-rolled log file
//!
//! ## Decode tracing
//!
//! Every recovered decode failure (unreadable hub, invalid string, stale
//! pointer) is logged at `trace` level by `svmprobe-core`. To capture those
//! without flooding the debugger console, write them to a file:
//!
//! ```rust,no_run
//! use svmprobe_utils::init_trace_file;
//!
//! let trace = init_trace_file(std::env::temp_dir()).expect("Failed to open trace file");
//! println!("tracing to {}", trace.path().display());
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_VAR: &str = "SVMPROBE_LOG_FORMAT";
/// Environment variable naming an additional log file.
pub const LOG_FILE_VAR: &str = "SVMPROBE_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// JSON format, one event per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (every recovered decode failure)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Resolved logging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings
{
    /// Output format
    pub format: LogFormat,
    /// Level used when `RUST_LOG` holds no usable filter
    pub level: LogLevel,
    /// Additional log file, rolled daily
    pub file: Option<PathBuf>,
}

impl Default for LogSettings
{
    fn default() -> Self
    {
        Self {
            format: LogFormat::Pretty,
            level: LogLevel::Info,
            file: None,
        }
    }
}

impl LogSettings
{
    /// Settings from the process environment.
    pub fn from_env() -> Self
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Settings from an arbitrary variable lookup.
    ///
    /// Unknown formats fall back to pretty output; a `RUST_LOG` that is not
    /// a plain level leaves the level at `info` (the filter itself is still
    /// honored by [`init_logging`]).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self
    {
        Self {
            format: lookup(LOG_FORMAT_VAR)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            level: lookup("RUST_LOG")
                .and_then(|s| s.parse().ok())
                .unwrap_or(LogLevel::Info),
            file: lookup(LOG_FILE_VAR).filter(|s| !s.is_empty()).map(PathBuf::from),
        }
    }
}

/// Keeps background log writers alive.
///
/// Buffered file output is flushed when the guard is dropped; hold it for
/// as long as the host is loaded.
#[derive(Debug, Default)]
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _workers: Vec<WorkerGuard>,
}

/// File-only trace log opened by [`init_trace_file`].
#[derive(Debug)]
#[must_use = "dropping the trace file stops tracing"]
pub struct TraceFile
{
    path: PathBuf,
    _guard: LoggingGuard,
}

impl TraceFile
{
    /// Path of the log file.
    pub fn path(&self) -> &Path
    {
        &self.path
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `svmprobe_core=trace`)
/// - `SVMPROBE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `SVMPROBE_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - The log file directory cannot be created
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let settings = LogSettings::from_env();
    let level = settings.level;
    install(&settings, || EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level)))
}

/// Initialize logging with explicit level and format
///
/// `SVMPROBE_LOG_FILE` is still honored.
///
/// ```rust,no_run
/// use svmprobe_utils::{init_logging_with_level, LogFormat, LogLevel};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    let settings = LogSettings {
        format,
        level,
        ..LogSettings::from_env()
    };
    install(&settings, || level_filter(level))
}

/// Initialize file-only logging at `trace` level
///
/// Creates `dir` if needed and writes to `YYYY-MM-DD-svmprobe-trace.log`
/// inside it. Nothing is written to the console. `RUST_LOG` overrides the
/// level when set.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the directory
/// cannot be created.
pub fn init_trace_file(dir: impl AsRef<Path>) -> Result<TraceFile, LoggingError>
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(LoggingError::FileError)?;
    let path = dir.join(trace_file_name(&Utc::now().format("%Y-%m-%d").to_string()));

    let settings = LogSettings {
        format: LogFormat::Pretty,
        level: LogLevel::Trace,
        file: Some(path.clone()),
    };
    let filter = env::var("RUST_LOG")
        .ok()
        .and_then(|filter| EnvFilter::try_new(filter).ok())
        .unwrap_or_else(|| level_filter(LogLevel::Trace));
    let guard = install_file_only(&settings, &path, filter)?;
    Ok(TraceFile { path, _guard: guard })
}

fn trace_file_name(date: &str) -> String
{
    format!("{date}-svmprobe-trace.log")
}

fn level_filter(level: LogLevel) -> EnvFilter
{
    EnvFilter::new(Level::from(level).to_string())
}

// Console layer on stderr, plus a file layer when one is configured. Each
// layer gets its own filter instance.
fn install(settings: &LogSettings, filter: impl Fn() -> EnvFilter) -> Result<LoggingGuard, LoggingError>
{
    let mut guard = LoggingGuard::default();
    let mut layers: Vec<BoxedLayer> = vec![format_layer(settings.format, io::stderr, true).with_filter(filter()).boxed()];
    if let Some(path) = &settings.file {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(LoggingError::FileError)?;
        let appender = tracing_appender::rolling::daily(parent, path.file_name().unwrap_or_default());
        let (writer, worker) = tracing_appender::non_blocking(appender);
        guard._workers.push(worker);
        layers.push(format_layer(settings.format, writer, false).with_filter(filter()).boxed());
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(guard)
}

fn install_file_only(settings: &LogSettings, path: &Path, filter: EnvFilter) -> Result<LoggingGuard, LoggingError>
{
    let parent = path.parent().unwrap_or(Path::new("."));
    // The date is already part of the file name.
    let appender = tracing_appender::rolling::never(parent, path.file_name().unwrap_or_default());
    let (writer, worker) = tracing_appender::non_blocking(appender);

    Registry::default()
        .with(format_layer(settings.format, writer, false).with_filter(filter))
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(LoggingGuard {
        _workers: vec![worker],
    })
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());
    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
