//! Configuration management for the Sprout client.
//!
//! Configuration is loaded from a platform config directory with sensible
//! defaults; every section implements `Default` and deserializes with
//! `#[serde(default)]` so a partial file is always valid.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for the Sprout client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Direct HTTPS channel and request defaults
    pub http: HttpConfig,

    /// Managed-gateway channel
    pub gateway: GatewayConfig,

    /// Service identity
    pub service: ServiceConfig,

    /// Analysis status polling
    pub polling: PollingConfig,

    /// Credential storage
    pub auth: AuthConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/dev.sprout-health.sprout/config.toml
    /// - Linux: ~/.config/sprout/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\sprout\config\config.toml
    ///
    /// Falls back to ~/.sprout/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "sprout-health", "sprout")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sprout").join("config.toml")
            })
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationError(format!("Failed to serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.timeout_ms, 120_000);
        assert_eq!(config.http.retry_attempts, 0);
        assert_eq!(config.polling.max_attempts, 30);
        assert_eq!(config.polling.interval_ms, 2000);
        assert!(!config.gateway.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [http]
            base_url = "https://staging.sprout-health.dev/v1"
            retry_attempts = 2
            "#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.http.base_url, "https://staging.sprout-health.dev/v1");
        assert_eq!(config.http.retry_attempts, 2);
        // Untouched sections fall back to defaults
        assert_eq!(config.http.timeout_ms, 120_000);
        assert_eq!(config.service.name, "sprout-api");
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not [valid toml").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.http.base_url, config.http.base_url);
        assert_eq!(parsed.polling.interval_ms, config.polling.interval_ms);
    }
}
