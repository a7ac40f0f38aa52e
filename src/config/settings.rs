//! Process settings for the `dircfg` binary.

use crate::config::WatchConfig;
use crate::{Error, Result};

/// How the binary prints each update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Concatenated payload bytes, unmodified.
    #[default]
    Raw,
    /// One JSON object per line.
    Json,
}

/// Main configuration for the dircfg process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory and suffix to watch.
    pub watch: WatchConfig,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub log_json: bool,

    /// Update output format.
    pub output: OutputFormat,
}

impl Config {
    /// Create a configuration for `watch` with default logging.
    #[must_use]
    pub fn new(watch: WatchConfig) -> Self {
        Self {
            watch,
            log_level: "info".to_string(),
            log_json: false,
            output: OutputFormat::default(),
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        self.watch.validate()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new(WatchConfig::new("/etc/server.d", ".toml"))
    }

    #[test]
    fn test_default_config() {
        let config = config();
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.output, OutputFormat::Raw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_validate_checks_watch_config() {
        let config = Config::new(WatchConfig::new("/etc/server.d", ""));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("suffix"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..config()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }
}
