//! Configuration management for the gitup CLI
//!
//! The CLI configuration is the library's [`UpdateConfig`] plus an
//! `[output]` table, stored as one TOML file.
//!
//! # Configuration File Locations
//!
//! - Linux: `~/.config/gitup/gitup.toml`
//! - macOS: `~/Library/Application Support/io.gitup.gitup/gitup.toml`
//! - Windows: `%APPDATA%\gitup\gitup\config\gitup.toml`

use std::path::{Path, PathBuf};

use gitup_updater::UpdateConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::OutputFormat;

/// Name of the option store file in the data directory.
const STATE_FILE: &str = "options.json";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// CLI configuration
///
/// # Example TOML
///
/// ```toml
/// [github]
/// # api_base = "https://ghe.example.com/api/v3"
/// # token = ""
///
/// [network]
/// timeout_seconds = 30
///
/// [log]
/// capacity = 20
/// # state_path = ""  # Empty = default data directory
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
/// verbose = false
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Update checker settings
    #[serde(flatten)]
    pub updater: UpdateConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        match custom_path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("io", "gitup", "gitup")
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("gitup.toml"))
    }

    /// Get the data directory path (option store)
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Option store file: `[log] state_path` if set, otherwise the data
    /// directory.
    pub fn state_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.updater.log.state_path {
            return Ok(path.clone());
        }
        Self::data_dir()
            .map(|dir| dir.join(STATE_FILE))
            .ok_or_else(|| {
                ConfigError::ValidationError(
                    "No data directory available; set [log] state_path".to_string(),
                )
            })
    }

    /// Write the commented sample configuration to `path`.
    pub fn write_sample(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::sample_toml())?;
        Ok(())
    }

    /// Parsed `[output] format`.
    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        self.output
            .format
            .parse()
            .map_err(ConfigError::ValidationError)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.updater
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# gitup configuration

[github]
# API base URL (empty = api.<host> of each repository URI)
# api_base = "https://ghe.example.com/api/v3"
# Personal access token, raises the API rate limit
# token = ""

[network]
# Request timeout in seconds
timeout_seconds = 30
# Explicit proxy URL
# proxy = "http://proxy.example.com:3128"
use_system_proxy = true

[log]
# Number of failed checks kept
capacity = 20
# Option store file (empty = default data directory)
# state_path = ""

[output]
# Output format: "table", "json", "quiet"
format = "table"
verbose = false

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

/// CLI configuration overrides
///
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Output format override
    pub output_format: Option<String>,
    /// Verbose flag override
    pub verbose: Option<bool>,
    /// Debug flag override
    pub debug: Option<bool>,
    /// API base override
    pub api_base: Option<String>,
    /// Token override
    pub token: Option<String>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
        }
        if overrides.debug == Some(true) {
            self.updater.logging.level = "debug".to_string();
        }
        if let Some(ref base) = overrides.api_base {
            self.updater.github.api_base = Some(base.clone());
        }
        if let Some(ref token) = overrides.token {
            self.updater.github.token = Some(token.clone());
        }
        self
    }
}
