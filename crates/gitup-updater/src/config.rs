//! Configuration structures for the update checker.
//!
//! Defines the repository host API settings, network limits and error log
//! settings. Loaded from TOML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::UpdateError;

/// Option key the error log is persisted under.
pub const ERROR_LOG_KEY: &str = "git-update-response-error";

/// Default error log capacity.
pub const DEFAULT_LOG_CAPACITY: usize = 20;

/// Main update checker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Repository host API configuration
    #[serde(default)]
    pub github: GitHubConfig,

    /// Network configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Error log configuration
    #[serde(default)]
    pub log: ErrorLogConfig,

    /// Diagnostic logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl UpdateConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, UpdateError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), UpdateError> {
        if let Some(base) = &self.github.api_base {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(UpdateError::ConfigError(format!(
                    "Invalid api_base '{}': must start with http:// or https://",
                    base
                )));
            }
        }

        if self.github.user_agent.trim().is_empty() {
            return Err(UpdateError::ConfigError(
                "user_agent must not be empty".to_string(),
            ));
        }

        if self.network.timeout_seconds == 0 {
            return Err(UpdateError::ConfigError(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.log.capacity == 0 {
            return Err(UpdateError::ConfigError(
                "log capacity must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(UpdateError::ConfigError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API base URL override (empty = derive `api.<host>` from the repository URI)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Personal access token sent as a bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// User agent; the API rejects requests without one
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            token: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Network configuration for tag requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Proxy URL for all requests (empty = none)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Honor HTTP(S)_PROXY environment variables
    #[serde(default = "default_true")]
    pub use_system_proxy: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            proxy: None,
            use_system_proxy: true,
        }
    }
}

/// Error log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogConfig {
    /// Maximum number of entries retained
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Option store file (empty = default data directory)
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            state_path: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn default_user_agent() -> String {
    format!("gitup-updater/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = UpdateConfig::default();
        assert!(config.github.api_base.is_none());
        assert!(config.github.token.is_none());
        assert!(config.github.user_agent.starts_with("gitup-updater/"));
        assert_eq!(config.network.timeout_seconds, 30);
        assert!(config.network.proxy.is_none());
        assert!(config.network.use_system_proxy);
        assert_eq!(config.log.capacity, 20);
        assert!(config.log.state_path.is_none());
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: UpdateConfig = toml::from_str(
            r#"
            [github]
            token = "ghp_example"

            [log]
            capacity = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_example"));
        assert!(config.github.user_agent.starts_with("gitup-updater/"));
        assert_eq!(config.log.capacity, 5);
        assert_eq!(config.network.timeout_seconds, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = UpdateConfig::default();
        config.network.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = UpdateConfig::default();
        config.log.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = UpdateConfig::default();
        config.github.api_base = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());

        let mut config = UpdateConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gitup.toml");
        std::fs::write(
            &path,
            "[github]\napi_base = \"https://ghe.example.com/api/v3\"\n\n[log]\ncapacity = 7\n",
        )
        .unwrap();

        let loaded = UpdateConfig::load_from_file(&path).unwrap();
        assert_eq!(
            loaded.github.api_base.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
        assert_eq!(loaded.log.capacity, 7);
        assert_eq!(loaded.network.timeout_seconds, 30);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gitup.toml");
        std::fs::write(&path, "[network]\ntimeout_seconds = \"soon\"\n").unwrap();
        assert!(matches!(
            UpdateConfig::load_from_file(&path),
            Err(UpdateError::ConfigError(_))
        ));
    }
}
