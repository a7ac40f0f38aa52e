//! Error types and Result aliases for dircfg.
//!
//! Only setup failures travel through `Result`. Everything that happens
//! while a session is already watching is surfaced as a notification or a
//! diagnostic instead, so the loop keeps running.

use thiserror::Error;

/// Result type alias using dircfg's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dircfg operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Directory watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised by the event source.
///
/// `Clone` so a runtime failure can be handed to the consumer and the
/// diagnostics sink alike.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// The event source could not subscribe to the directory.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Asynchronous failure reported by the event source while watching.
    #[error("event source error: {0}")]
    Source(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl WatchError {
    /// Create a setup failure for `path`.
    pub fn watch_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WatchFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<notify::Error> for WatchError {
    fn from(err: notify::Error) -> Self {
        Self::Source(err.to_string())
    }
}
