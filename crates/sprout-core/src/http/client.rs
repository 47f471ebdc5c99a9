//! The retry controller - the unit every other component calls.
//!
//! `ApiClient` wraps a transport with bounded retry, a fixed inter-attempt
//! delay, and response classification. Upper layers never talk to a
//! `Transport` directly.

use super::classify::classify;
use super::direct::DirectTransport;
use super::gateway::GatewayTransport;
use super::transport::Transport;
use super::types::{RequestSpec, Verb, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT};
use crate::config::Config;
use crate::error::ApiError;
use crate::platform::Platform;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-request defaults applied to specs built through the convenience
/// wrappers.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub timeout: Duration,
    pub retry_budget: u32,
    pub retry_delay: Duration,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry_budget: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    platform: Platform,
    service_name: String,
    defaults: RequestDefaults,
}

impl ApiClient {
    /// Build a client from configuration, selecting the channel once at
    /// construction: gateway when enabled and an environment id is set,
    /// direct HTTPS otherwise.
    pub fn from_config(config: &Config, platform: Platform) -> Self {
        let transport: Arc<dyn Transport> =
            if config.gateway.enabled && !config.gateway.env_id.is_empty() {
                Arc::new(GatewayTransport::new(&config.gateway))
            } else {
                Arc::new(DirectTransport::new(&config.http))
            };
        tracing::debug!(channel = transport.name(), "transport channel selected");

        Self {
            transport,
            platform,
            service_name: config.service.name.clone(),
            defaults: RequestDefaults {
                timeout: config.http.timeout(),
                retry_budget: config.http.retry_attempts,
                retry_delay: config.http.retry_delay(),
            },
        }
    }

    /// Build a client around an explicit transport. Useful for embedding and
    /// for tests.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        platform: Platform,
        service_name: impl Into<String>,
        defaults: RequestDefaults,
    ) -> Self {
        Self {
            transport,
            platform,
            service_name: service_name.into(),
            defaults,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Common headers, rebuilt per attempt so a token change between
    /// attempts is picked up.
    fn common_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("X-Service".to_string(), self.service_name.clone());
        if let Some(token) = self.platform.credentials.read_token() {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        headers
    }

    /// One physical attempt: merge headers, execute, classify, decode.
    async fn attempt<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, ApiError> {
        let mut headers = self.common_headers();
        headers.extend(spec.headers.clone());

        let raw = self.transport.execute(spec, &headers).await?;
        let data = classify(raw, spec.show_error, &self.platform)?;
        serde_json::from_value(data).map_err(|e| ApiError::Transport {
            status: None,
            message: format!("unexpected response shape: {e}"),
        })
    }

    /// Execute a request with bounded retry and a fixed inter-attempt delay.
    ///
    /// For `retry_budget = N` the transport is attempted at most `N + 1`
    /// times. Every failure, transport-level or classified, consumes an
    /// attempt; on exhaustion the last error is wrapped in `RetryExhausted`.
    pub async fn request<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T, ApiError> {
        let attempts = spec.retry_budget + 1;
        let mut last_error: Option<ApiError> = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tracing::debug!(
                    path = %spec.path,
                    attempt,
                    attempts,
                    "retrying after {:?}",
                    spec.retry_delay
                );
                tokio::time::sleep(spec.retry_delay).await;
            }

            match self.attempt::<T>(&spec).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::debug!(path = %spec.path, attempt, %err, "request attempt failed");
                    last_error = Some(err);
                }
            }
        }

        // All attempts failed. Business errors already surfaced their own
        // message during classification; everything else gets the generic
        // transport-failure notification.
        let last = last_error.unwrap_or_else(|| ApiError::Transport {
            status: None,
            message: "no attempts were made".to_string(),
        });
        if spec.show_error && !last.is_business() {
            self.platform.notifier.notify("network request failed");
        }
        tracing::warn!(path = %spec.path, attempts, %last, "request exhausted its attempt budget");
        Err(ApiError::RetryExhausted {
            attempts,
            source: Box::new(last),
        })
    }

    /// GET with optional query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut spec = self.base_spec(Verb::Get, path);
        spec.payload = params;
        self.request(spec).await
    }

    /// POST with an optional JSON body.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut spec = self.base_spec(Verb::Post, path);
        spec.payload = body;
        self.request(spec).await
    }

    /// PUT with an optional JSON body.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut spec = self.base_spec(Verb::Put, path);
        spec.payload = body;
        self.request(spec).await
    }

    /// DELETE with optional query parameters.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut spec = self.base_spec(Verb::Delete, path);
        spec.payload = params;
        self.request(spec).await
    }

    /// A spec carrying this client's configured defaults.
    pub fn base_spec(&self, verb: Verb, path: &str) -> RequestSpec {
        RequestSpec::new(verb, path)
            .with_timeout(self.defaults.timeout)
            .with_retry(self.defaults.retry_budget, self.defaults.retry_delay)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scriptable transport shared by the client/registry/tips tests.

    use super::*;
    use crate::http::types::RawResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    type ResponseFn =
        Box<dyn Fn(&RequestSpec, u32) -> Result<RawResponse, ApiError> + Send + Sync>;

    /// Transport driven by a response factory keyed on (spec, call index).
    pub(crate) struct MockTransport {
        response_fn: ResponseFn,
        calls: AtomicU32,
        seen: Mutex<Vec<(String, HashMap<String, String>)>>,
    }

    impl MockTransport {
        pub fn new(
            response_fn: impl Fn(&RequestSpec, u32) -> Result<RawResponse, ApiError>
                + Send
                + Sync
                + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                response_fn: Box::new(response_fn),
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn seen_paths(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
        }

        pub fn seen_headers(&self) -> Vec<HashMap<String, String>> {
            self.seen.lock().unwrap().iter().map(|(_, h)| h.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        fn name(&self) -> &str {
            "mock"
        }

        async fn execute(
            &self,
            spec: &RequestSpec,
            headers: &HashMap<String, String>,
        ) -> Result<RawResponse, ApiError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((spec.path.clone(), headers.clone()));
            (self.response_fn)(spec, index)
        }
    }

    /// A 200 response wrapping `data` in a success envelope.
    pub(crate) fn envelope_ok(data: Value) -> RawResponse {
        RawResponse {
            status: 200,
            body: serde_json::json!({"code": 0, "message": "ok", "data": data}).to_string(),
        }
    }

    /// A 200 response with a business rejection envelope.
    pub(crate) fn envelope_err(code: i32, message: &str) -> RawResponse {
        RawResponse {
            status: 200,
            body: serde_json::json!({"code": code, "message": message}).to_string(),
        }
    }

    /// A bare non-200 response.
    pub(crate) fn status_response(status: u16, message: &str) -> RawResponse {
        RawResponse {
            status,
            body: serde_json::json!({"code": -1, "message": message}).to_string(),
        }
    }

    pub(crate) fn connection_refused() -> ApiError {
        ApiError::Transport {
            status: None,
            message: "network failure: connection refused".to_string(),
        }
    }
}
