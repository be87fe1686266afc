//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging. Precedence,
//! lowest to highest: built-in defaults, config file, CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::collector::CollectorConfig;
use crate::error::ConfigError;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Web endpoint settings
    pub web: WebConfig,
    /// Logging settings
    pub log: LogConfig,
    /// Collection settings
    pub collect: CollectConfig,
}

/// Web endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for the HTTP server
    pub listen_address: String,
    /// Path under which to expose metrics
    pub telemetry_path: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9402".to_string(),
            telemetry_path: "/metrics".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum log level
    pub level: LogLevel,
}

/// Collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Export per-process utilization (more expensive, higher cardinality)
    pub per_process: bool,
    /// Averaging window in seconds for the NVML sample queries
    pub average_window_seconds: u64,
    /// Upper bound on process samples per device
    pub max_process_samples: usize,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            per_process: false,
            average_window_seconds: 10,
            max_process_samples: 10,
        }
    }
}

impl CollectConfig {
    /// Convert to the collector's configuration
    pub fn to_collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            per_process: self.per_process,
            average_window: Duration::from_secs(self.average_window_seconds),
            max_process_samples: self.max_process_samples,
        }
    }
}

/// Minimum log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages and above
    #[default]
    Info,
    /// Everything, including per-field collection failures
    Debug,
}

impl LogLevel {
    /// Filter string understood by env_logger
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl Config {
    /// Resolve the effective configuration from defaults, the config file
    /// (if one exists), and CLI overrides
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match config_file_path(cli) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if cli.config.is_some() => {
                // An explicitly requested file must exist
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            _ => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(addr) = &cli.listen_address {
            self.web.listen_address = addr.clone();
        }
        if let Some(path) = &cli.telemetry_path {
            self.web.telemetry_path = path.clone();
        }
        if let Some(level) = cli.log_level {
            self.log.level = level;
        }
        if cli.per_process {
            self.collect.per_process = true;
        }
    }
}

/// The explicit --config path, or the default location
fn config_file_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(path) = &cli.config {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("nvexporter").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.web.listen_address, "0.0.0.0:9402");
        assert_eq!(config.web.telemetry_path, "/metrics");
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(!config.collect.per_process);
        assert_eq!(config.collect.average_window_seconds, 10);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [web]
            listen_address = "127.0.0.1:9400"

            [log]
            level = "debug"

            [collect]
            per_process = true
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.web.listen_address, "127.0.0.1:9400");
        // Unset fields keep their defaults
        assert_eq!(config.web.telemetry_path, "/metrics");
        assert_eq!(config.log.level, LogLevel::Debug);
        assert!(config.collect.per_process);
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not toml at all [").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [web]
            listen_address = "127.0.0.1:9400"
            "#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::try_parse_from([
            "nvexporter",
            "--config",
            &path,
            "--listen-address",
            "0.0.0.0:9500",
            "--per-process",
        ])
        .unwrap();

        let config = Config::load(&cli).unwrap();
        assert_eq!(config.web.listen_address, "0.0.0.0:9500");
        assert!(config.collect.per_process);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let cli = Cli::try_parse_from(["nvexporter", "--config", "/no/such/file.toml"]).unwrap();
        assert!(matches!(
            Config::load(&cli),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_collector_config_conversion() {
        let collect = CollectConfig {
            per_process: true,
            average_window_seconds: 5,
            max_process_samples: 3,
        };
        let config = collect.to_collector_config();
        assert!(config.per_process);
        assert_eq!(config.average_window, Duration::from_secs(5));
        assert_eq!(config.max_process_samples, 3);
    }
}
