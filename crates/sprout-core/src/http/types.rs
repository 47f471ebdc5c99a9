//! Request and response types shared by both transport channels.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Default fixed delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// HTTP verb subset the service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    pub(crate) fn to_method(self) -> reqwest::Method {
        match self {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One logical request: path, verb, payload, and retry/notification policy.
///
/// Immutable per call sequence; the retry controller re-executes the same
/// spec for every attempt.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// Service path, e.g. `/analysis/42/status`
    pub path: String,

    pub verb: Verb,

    /// JSON payload; query string for GET, request body otherwise
    pub payload: Option<Value>,

    /// Extra headers merged over the common set
    pub headers: HashMap<String, String>,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Retries after the initial attempt (total attempts = budget + 1)
    pub retry_budget: u32,

    /// Fixed delay between attempts
    pub retry_delay: Duration,

    /// Whether failures may surface a user-visible notification
    pub show_error: bool,
}

impl RequestSpec {
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            verb,
            payload: None,
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_budget: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            show_error: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Verb::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Verb::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Verb::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Verb::Delete, path)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, budget: u32, delay: Duration) -> Self {
        self.retry_budget = budget;
        self.retry_delay = delay;
        self
    }

    /// Suppress user-visible notifications for this call.
    pub fn silent(mut self) -> Self {
        self.show_error = false;
        self
    }
}

/// Raw outcome of one physical transport attempt.
///
/// The body is kept as text; envelope parsing (and its failure handling)
/// belongs to the classifier.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// The service's uniform response envelope.
///
/// Invariant: `code == 0` iff the request is a business success; the HTTP
/// status carries the transport-level outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiEnvelope {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl Default for ApiEnvelope {
    fn default() -> Self {
        Self {
            code: 0,
            message: String::new(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_defaults() {
        let spec = RequestSpec::get("/analysis/1/status");
        assert_eq!(spec.verb, Verb::Get);
        assert_eq!(spec.timeout, DEFAULT_TIMEOUT);
        assert_eq!(spec.retry_budget, 0);
        assert_eq!(spec.retry_delay, DEFAULT_RETRY_DELAY);
        assert!(spec.show_error);
        assert!(spec.payload.is_none());
    }

    #[test]
    fn test_spec_builder() {
        let spec = RequestSpec::post("/analysis")
            .with_payload(json!({"baby_id": 7}))
            .with_retry(2, Duration::from_millis(50))
            .with_header("X-Trace", "abc")
            .silent();
        assert_eq!(spec.retry_budget, 2);
        assert_eq!(spec.retry_delay, Duration::from_millis(50));
        assert!(!spec.show_error);
        assert_eq!(spec.headers.get("X-Trace").unwrap(), "abc");
    }

    #[test]
    fn test_envelope_parses_partial_body() {
        let envelope: ApiEnvelope = serde_json::from_str(r#"{"code": 1102}"#).unwrap();
        assert_eq!(envelope.code, 1102);
        assert!(envelope.message.is_empty());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_verb_strings() {
        assert_eq!(Verb::Get.as_str(), "GET");
        assert_eq!(Verb::Delete.as_str(), "DELETE");
    }
}
