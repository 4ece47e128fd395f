//! Internal logging for the Orrery3D engine
//!
//! All engine diagnostics flow through one dispatch path: the
//! `engine_*!` macros capture the call site and hand a `LogEntry` to
//! whichever `Logger` is installed. The built-in `DefaultLogger` filters
//! by severity and prints compact single-line output to stderr; anything
//! fancier (files, capture buffers for tests) is a custom `Logger`.

use std::fmt;
use colored::*;
use chrono::{DateTime, Local};

/// Sink for engine log entries.
///
/// Install an implementation with `Engine::set_logger` to redirect
/// diagnostics (to a file, a test capture buffer, ...).
pub trait Logger: Send + Sync {
    /// Consume one entry.
    fn log(&self, entry: &LogEntry);
}

/// Severity of a log entry, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose tracing, off by default
    Trace,
    /// Development diagnostics
    Debug,
    /// Notable events (resource creation, feature fallbacks)
    Info,
    /// Something degraded but rendering continues
    Warn,
    /// A real failure; the entry's call site is worth reading
    Error,
}

impl LogSeverity {
    /// Fixed-width colored console tag.
    fn console_label(&self) -> ColoredString {
        match self {
            LogSeverity::Trace => "trace".dimmed(),
            LogSeverity::Debug => "debug".cyan(),
            LogSeverity::Info => "info ".green(),
            LogSeverity::Warn => "warn ".yellow(),
            LogSeverity::Error => "error".red().bold(),
        }
    }
}

/// Call site of a log entry, captured by the logging macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One log entry, fully formed. Every entry carries its call site; it
/// is up to the logger how much of it to show.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    /// Local wall-clock time the entry was created
    pub timestamp: DateTime<Local>,

    /// Originating subsystem (e.g. "orrery3d::ViewRenderer")
    pub source: String,

    pub message: String,

    /// Where the log macro was invoked
    pub location: SourceLocation,
}

/// Console logger used when no custom logger is installed.
///
/// Prints one line per entry to stderr:
///
/// ```text
/// 14:03:55.120 info  orrery3d::ViewRenderer Created 1 1024x1024 shadow buffer(s)
/// 14:03:55.121 error orrery3d::ViewRenderer Failed to create shadow buffer (src/renderer/view_renderer.rs:213)
/// ```
///
/// Entries below the minimum severity are dropped; the call site is
/// appended for errors only.
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    /// Logger printing entries at or above the given severity.
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// True if entries at this severity are printed.
    pub fn enabled(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }
}

impl Default for DefaultLogger {
    /// Debug and above; tracing stays off unless asked for.
    fn default() -> Self {
        Self::with_min_severity(LogSeverity::Debug)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.enabled(entry.severity) {
            return;
        }

        let timestamp = entry.timestamp.format("%H:%M:%S%.3f").to_string();

        let location_suffix = if entry.severity == LogSeverity::Error {
            format!(" ({})", entry.location)
        } else {
            String::new()
        };

        eprintln!(
            "{} {} {} {}{}",
            timestamp.dimmed(),
            entry.severity.console_label(),
            entry.source.bold(),
            entry.message,
            location_suffix
        );
    }
}

// ===== LOGGING MACROS =====

/// Dispatch a log entry at an explicit severity, capturing the call
/// site. The severity-named macros below are the usual entry points.
#[macro_export]
macro_rules! engine_log {
    ($severity:expr, $source:expr, $($arg:tt)*) => {
        $crate::engine::Engine::dispatch(
            $severity,
            $source,
            format_args!($($arg)*),
            $crate::log::SourceLocation {
                file: file!(),
                line: line!(),
            },
        )
    };
}

/// Log at Trace severity (very verbose, dropped by the default logger)
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Trace, $source, $($arg)*)
    };
}

/// Log at Debug severity
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Debug, $source, $($arg)*)
    };
}

/// Log at Info severity
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Info, $source, $($arg)*)
    };
}

/// Log at Warn severity
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Warn, $source, $($arg)*)
    };
}

/// Log at Error severity
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Error, $source, $($arg)*)
    };
}

/// Log an error and produce an `Error::BackendError` with the same
/// message
///
/// Useful with `ok_or_else` and `map_err`:
///
/// ```ignore
/// let face = cube_map.face(face)
///     .ok_or_else(|| engine_err!("orrery3d::ViewRenderer", "Cube map face {} missing", i))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_log!($crate::log::LogSeverity::Error, $source, "{}", message);
        $crate::error::Error::BackendError(message)
    }};
}

/// Log an error and early-return it from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
