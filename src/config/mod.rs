//! Configuration management for dircfg.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Defaults (lowest priority)

mod settings;
mod watch;

pub use settings::{Config, OutputFormat};
pub use watch::{WatchConfig, DEFAULT_CHANNEL_CAPACITY};
