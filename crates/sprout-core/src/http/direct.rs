//! Direct HTTPS request channel, the universal fallback.

use super::transport::{append_query, dispatch, parse_url, Transport};
use super::types::{RawResponse, RequestSpec, Verb};
use crate::config::HttpConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use std::collections::HashMap;

pub struct DirectTransport {
    base_url: String,
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn build_url(&self, spec: &RequestSpec) -> Result<reqwest::Url, ApiError> {
        let path = if spec.path.starts_with('/') {
            spec.path.clone()
        } else {
            format!("/{}", spec.path)
        };
        let mut url = parse_url(&format!("{}{}", self.base_url, path))?;
        if spec.verb == Verb::Get {
            if let Some(payload) = &spec.payload {
                append_query(&mut url, payload);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for DirectTransport {
    fn name(&self) -> &str {
        "direct"
    }

    async fn execute(
        &self,
        spec: &RequestSpec,
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, ApiError> {
        let url = self.build_url(spec)?;
        tracing::trace!(channel = self.name(), %url, verb = spec.verb.as_str(), "dispatching request");
        dispatch(&self.client, url, spec, headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport() -> DirectTransport {
        DirectTransport::new(&HttpConfig {
            base_url: "https://api.sprout-health.dev/v1/".into(),
            ..HttpConfig::default()
        })
    }

    #[test]
    fn test_build_url_joins_base_and_path() {
        let spec = RequestSpec::get("/analysis/7/status");
        let url = transport().build_url(&spec).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.sprout-health.dev/v1/analysis/7/status"
        );
    }

    #[test]
    fn test_build_url_get_appends_query() {
        let spec = RequestSpec::get("/tips").with_payload(json!({"baby_id": 7, "date": "2024-01-01"}));
        let url = transport().build_url(&spec).unwrap();
        assert!(url.as_str().starts_with("https://api.sprout-health.dev/v1/tips?"));
        assert!(url.query().unwrap().contains("baby_id=7"));
    }

    #[test]
    fn test_build_url_post_keeps_payload_out_of_query() {
        let spec = RequestSpec::post("/analysis").with_payload(json!({"baby_id": 7}));
        let url = transport().build_url(&spec).unwrap();
        assert!(url.query().is_none());
    }

    #[test]
    fn test_build_url_accepts_relative_path() {
        let spec = RequestSpec::get("tips");
        let url = transport().build_url(&spec).unwrap();
        assert_eq!(url.as_str(), "https://api.sprout-health.dev/v1/tips");
    }
}
