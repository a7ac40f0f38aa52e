//! Per-session watch settings.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Single-slot handoff between the watch loop and a channel consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// What one watch session observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Directory holding the configuration fragments. Not watched recursively.
    pub directory: PathBuf,

    /// File name suffix selecting the fragments, matched exactly and
    /// case-sensitively (`"toml"` and `".toml"` are different filters).
    pub suffix: String,

    /// Notifications the channel adapter may hold before the loop blocks.
    pub channel_capacity: usize,
}

impl WatchConfig {
    /// Create a config with the default channel capacity.
    pub fn new(directory: impl AsRef<Path>, suffix: impl Into<String>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            suffix: suffix.into(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Override the channel capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::config("directory cannot be empty"));
        }

        if self.suffix.is_empty() {
            return Err(Error::config("suffix cannot be empty"));
        }

        if self.suffix.contains('/') || self.suffix.contains(std::path::MAIN_SEPARATOR) {
            return Err(Error::config(format!(
                "suffix '{}' cannot contain a path separator",
                self.suffix
            )));
        }

        if self.channel_capacity == 0 {
            return Err(Error::config("channel_capacity cannot be 0"));
        }

        Ok(())
    }
}
