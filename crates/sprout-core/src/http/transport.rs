//! Transport strategy trait and request plumbing shared by both channels.
//!
//! A transport performs exactly one physical attempt; retry, classification,
//! and side effects all live above this seam.

use super::types::{RawResponse, RequestSpec, Verb};
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Trait both request channels implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the client holds an `Arc<dyn Transport>` chosen at construction).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Channel name for logging (e.g. "gateway", "direct").
    fn name(&self) -> &str;

    /// Perform one physical request attempt.
    ///
    /// Resolves with the raw status/body, or fails with a transport-level
    /// error (network failure, timeout). `headers` is the already-merged
    /// header set the attempt must carry.
    async fn execute(
        &self,
        spec: &RequestSpec,
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, ApiError>;
}

/// Append a JSON object as query parameters, skipping null entries.
pub(crate) fn append_query(url: &mut reqwest::Url, params: &Value) {
    let Some(map) = params.as_object() else {
        return;
    };
    let mut pairs = url.query_pairs_mut();
    for (key, value) in map {
        match value {
            Value::Null => continue,
            Value::String(s) => {
                pairs.append_pair(key, s);
            }
            other => {
                pairs.append_pair(key, &other.to_string());
            }
        }
    }
}

/// Send one request and capture the raw response.
///
/// Shared by both channels: applies headers, the per-attempt timeout, and a
/// JSON body for non-GET payloads. GET payloads must already be folded into
/// the URL by the caller.
pub(crate) async fn dispatch(
    client: &reqwest::Client,
    url: reqwest::Url,
    spec: &RequestSpec,
    headers: &HashMap<String, String>,
) -> Result<RawResponse, ApiError> {
    let mut request = client
        .request(spec.verb.to_method(), url)
        .timeout(spec.timeout);

    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    if spec.verb != Verb::Get {
        if let Some(payload) = &spec.payload {
            request = request.json(payload);
        }
    }

    let response = request.send().await.map_err(|e| {
        let message = if e.is_timeout() {
            format!("request timed out after {}ms", spec.timeout.as_millis())
        } else {
            format!("network failure: {e}")
        };
        ApiError::Transport {
            status: None,
            message,
        }
    })?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| ApiError::Transport {
        status: Some(status),
        message: format!("failed to read response body: {e}"),
    })?;

    Ok(RawResponse { status, body })
}

/// Parse a URL, mapping failure onto the transport error class.
pub(crate) fn parse_url(raw: &str) -> Result<reqwest::Url, ApiError> {
    reqwest::Url::parse(raw).map_err(|e| ApiError::Transport {
        status: None,
        message: format!("invalid request URL {raw}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_query_basic() {
        let mut url = reqwest::Url::parse("https://api.example.com/tips").unwrap();
        append_query(&mut url, &json!({"baby_id": 7, "date": "2024-01-01"}));
        let query = url.query().unwrap();
        assert!(query.contains("baby_id=7"));
        assert!(query.contains("date=2024-01-01"));
    }

    #[test]
    fn test_append_query_skips_nulls() {
        let mut url = reqwest::Url::parse("https://api.example.com/tips").unwrap();
        append_query(&mut url, &json!({"baby_id": 7, "date": null}));
        assert_eq!(url.query().unwrap(), "baby_id=7");
    }

    #[test]
    fn test_append_query_encodes_values() {
        let mut url = reqwest::Url::parse("https://api.example.com/search").unwrap();
        append_query(&mut url, &json!({"q": "a b&c"}));
        assert_eq!(url.query().unwrap(), "q=a+b%26c");
    }

    #[test]
    fn test_append_query_ignores_non_object() {
        let mut url = reqwest::Url::parse("https://api.example.com/tips").unwrap();
        append_query(&mut url, &json!([1, 2, 3]));
        assert!(url.query().is_none());
    }
}
