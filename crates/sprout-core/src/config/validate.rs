//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.http.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "http.base_url must not be empty".into(),
            ));
        }
        if self.http.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_ms must be > 0".into(),
            ));
        }
        if self.http.retry_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "http.retry_delay_ms must be > 0".into(),
            ));
        }
        if self.gateway.enabled && self.gateway.env_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.env_id must be set when gateway.enabled is true".into(),
            ));
        }
        if self.gateway.enabled && self.gateway.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.endpoint must be set when gateway.enabled is true".into(),
            ));
        }
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "polling.max_attempts must be > 0".into(),
            ));
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "polling.interval_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = Config::default();
        config.http.base_url = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_gateway_enabled_requires_env_id() {
        let mut config = Config::default();
        config.gateway.enabled = true;
        config.gateway.env_id = String::new();
        assert!(config.validate().is_err());

        config.gateway.env_id = "prod-7f2c1a".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_polling_interval_rejected() {
        let mut config = Config::default();
        config.polling.interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
