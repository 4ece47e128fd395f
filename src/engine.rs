/// Orrery3D Engine - process-wide services shared by engine subsystems.
///
/// The only global state the engine keeps is the logger slot. Renderers
/// own their collaborators (graphics device, render context) directly;
/// they are constructed by the caller and injected, never looked up
/// globally.

use std::fmt;
use std::sync::{Arc, RwLock};
use chrono::Local;
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger, SourceLocation};

/// Installed logger. An empty slot means entries go to a DefaultLogger.
static LOGGER: RwLock<Option<Arc<dyn Logger>>> = RwLock::new(None);

/// Process-wide engine services.
///
/// Holds the logger slot used by the `engine_log!` macro family. Until a
/// custom logger is installed, entries are printed by `DefaultLogger`.
pub struct Engine;

impl Engine {
    /// Install a custom logger (file logger, capture logger for tests,
    /// ...), replacing whatever was installed before.
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut slot) = LOGGER.write() {
            *slot = Some(Arc::new(logger));
        }
    }

    /// Remove any installed logger, returning to default console output.
    pub fn reset_logger() {
        if let Ok(mut slot) = LOGGER.write() {
            *slot = None;
        }
    }

    /// Build a log entry and hand it to the installed logger.
    ///
    /// This is the single funnel behind the `engine_log!` macro family;
    /// call it directly only when the severity is computed at runtime.
    pub fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: fmt::Arguments<'_>,
        location: SourceLocation,
    ) {
        let entry = LogEntry {
            severity,
            timestamp: Local::now(),
            source: source.to_string(),
            message: message.to_string(),
            location,
        };

        // Take a handle out of the slot so the lock is released before
        // the logger runs; a logger is allowed to log.
        let logger = match LOGGER.read() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };

        match logger {
            Some(logger) => logger.log(&entry),
            None => DefaultLogger::default().log(&entry),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
