//! Logger configuration, deserialized from the `[logger]` table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> PathBuf {
    PathBuf::from("logs/scheme.log")
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub file: FileConfig,
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<()> {
        self.parse_level()?;
        self.file.validate()?;
        if !self.console.enabled && !self.file.enabled {
            anyhow::bail!("At least one output (console or file) must be enabled");
        }
        Ok(())
    }

    pub fn parse_level(&self) -> Result<Level> {
        self.level
            .parse::<Level>()
            .with_context(|| format!("Invalid log level '{}'", self.level))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// ANSI colors, applied only when stdout is a terminal.
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// File output, rotated by size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    #[serde(default = "default_true")]
    pub append: bool,
    #[serde(default)]
    pub format: LogFormat,
    /// Bytes written before the file is rotated.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    /// Rotated files kept next to the live one.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl FileConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.path.as_os_str().is_empty() {
            anyhow::bail!("File path is required when file logging is enabled");
        }
        if self.max_size == 0 {
            anyhow::bail!("max_size must be greater than 0");
        }
        if self.max_files == 0 {
            anyhow::bail!("max_files must be greater than 0");
        }
        Ok(())
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: LogFormat::default(),
            max_size: default_max_size(),
            max_files: default_max_files(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    #[default]
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LoggerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.parse_level().unwrap(), Level::INFO);
        assert_eq!(config.file.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_level() {
        let config = LoggerConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_output_enabled() {
        let mut config = LoggerConfig::default();
        config.console.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_file_needs_limits() {
        let mut config = LoggerConfig::default();
        config.file.enabled = true;
        config.file.max_files = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_table() {
        let config: LoggerConfig = toml::from_str(
            r#"
level = "debug"
[file]
enabled = true
format = "compact"
"#,
        )
        .unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.console.enabled);
        assert_eq!(config.file.format, LogFormat::Compact);
        assert_eq!(config.file.max_files, 5);
    }
}
