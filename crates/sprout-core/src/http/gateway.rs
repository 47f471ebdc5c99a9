//! Managed-gateway request channel.
//!
//! Inside a trusted host runtime requests are routed through a managed
//! gateway instead of going to the service origin directly. The gateway
//! addresses services by path only, so the path is normalized to be absolute
//! and to carry the fixed API version prefix; the target environment travels
//! in a header.

use super::transport::{append_query, dispatch, parse_url, Transport};
use super::types::{RawResponse, RequestSpec, Verb};
use crate::config::GatewayConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Header carrying the gateway environment identifier.
pub(crate) const ENV_HEADER: &str = "X-Gateway-Env";

/// API version prefix the backend routes under.
const VERSION_PREFIX: &str = "/v1";

pub struct GatewayTransport {
    endpoint: String,
    env_id: String,
    client: reqwest::Client,
}

impl GatewayTransport {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            env_id: config.env_id.clone(),
            client: reqwest::Client::new(),
        }
    }
}

/// Make a path absolute and ensure it carries the version prefix.
///
/// Callers pass paths like `/analysis/42/status`; the direct channel's base
/// URL already ends in the version suffix, so only the gateway needs to
/// prepend it.
pub(crate) fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if !normalized.starts_with(VERSION_PREFIX) {
        normalized = format!("{VERSION_PREFIX}{normalized}");
    }
    normalized
}

#[async_trait]
impl Transport for GatewayTransport {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn execute(
        &self,
        spec: &RequestSpec,
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, ApiError> {
        let path = normalize_path(&spec.path);
        let mut url = parse_url(&format!("{}{}", self.endpoint, path))?;

        // The gateway does not support a GET body; fold the payload into
        // the query string instead.
        if spec.verb == Verb::Get {
            if let Some(payload) = &spec.payload {
                append_query(&mut url, payload);
            }
        }

        let mut headers = headers.clone();
        headers.insert(ENV_HEADER.to_string(), self.env_id.clone());

        tracing::trace!(channel = self.name(), %url, verb = spec.verb.as_str(), "dispatching request");
        dispatch(&self.client, url, spec, &headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_leading_slash() {
        assert_eq!(normalize_path("auth/login"), "/v1/auth/login");
    }

    #[test]
    fn test_normalize_adds_version_prefix() {
        assert_eq!(normalize_path("/analysis/7/status"), "/v1/analysis/7/status");
    }

    #[test]
    fn test_normalize_keeps_existing_prefix() {
        assert_eq!(normalize_path("/v1/tips"), "/v1/tips");
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = GatewayConfig {
            enabled: true,
            env_id: "prod-7f2c1a".into(),
            endpoint: "https://gateway.sprout-health.dev/".into(),
        };
        let transport = GatewayTransport::new(&config);
        assert_eq!(transport.endpoint, "https://gateway.sprout-health.dev");
    }
}
