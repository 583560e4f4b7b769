//! # svmprobe Utilities
//!
//! Logging setup for svmprobe host adapters.
//!
//! `svmprobe-core` only emits `tracing` events. A host (debugger bridge,
//! test harness) picks how those are collected with the helpers here:
//! console logging driven by `RUST_LOG`, or a file-only trace log for
//! chasing decode failures.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_with_level, init_trace_file, LogFormat, LogLevel, LogSettings, LoggingError,
    LoggingGuard, TraceFile,
};
pub use tracing::{debug, error, info, trace, warn};
