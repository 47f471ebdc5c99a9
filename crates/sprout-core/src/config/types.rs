//! Sub-configuration structs with client-side defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Direct HTTPS channel settings and request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base URL of the analysis service (includes the API version suffix)
    pub base_url: String,

    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,

    /// Default retry attempts after the initial try
    pub retry_attempts: u32,

    /// Fixed delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.sprout-health.dev/v1".to_string(),
            timeout_ms: 120_000,
            retry_attempts: 0,
            retry_delay_ms: 1000,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Managed-gateway channel settings.
///
/// When enabled (and an environment id is configured) requests are routed
/// through the gateway instead of the direct HTTPS channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Route requests through the managed gateway
    pub enabled: bool,

    /// Gateway environment identifier
    pub env_id: String,

    /// Gateway endpoint URL
    pub endpoint: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            env_id: String::new(),
            endpoint: "https://gateway.sprout-health.dev".to_string(),
        }
    }
}

/// Service identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Value of the service-identifier header sent with every request
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "sprout-api".to_string(),
        }
    }
}

/// Analysis status-polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Maximum status queries per poll sequence
    pub max_attempts: u32,

    /// Fixed delay between status queries in milliseconds
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval_ms: 2000,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Credential storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// File the bearer token is persisted in (`~` is expanded by consumers)
    pub token_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: "~/.config/sprout/token".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
