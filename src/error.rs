//! Error types for the Orrery3D engine
//!
//! This module defines the error types used throughout the engine,
//! covering renderer lifecycle misuse and graphics backend failures.

use std::fmt;

/// Result type for Orrery3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Orrery3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A render or view-set call was made before initialize_graphics()
    Uninitialized,

    /// A render call was made outside begin_view_set() / end_view_set()
    NoViewSet,

    /// begin_view_set() was called again before end_view_set()
    ViewSetAlreadyStarted,

    /// Degenerate caller input (zero-area viewport, zero-size shadow map, ...)
    BadParameter(String),

    /// Backend-specific error (GL, Vulkan, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Uninitialized => write!(f, "Renderer not initialized"),
            Error::NoViewSet => write!(f, "No view set started"),
            Error::ViewSetAlreadyStarted => write!(f, "View set already started"),
            Error::BadParameter(msg) => write!(f, "Bad parameter: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
