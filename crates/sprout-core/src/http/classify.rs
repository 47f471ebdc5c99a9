//! Response classification.
//!
//! Maps one raw transport outcome onto exactly one of the five error/success
//! classes and fires the side effects each class requires. Auth expiry is
//! handled here, centrally, regardless of which caller triggered it.

use super::types::{ApiEnvelope, RawResponse};
use crate::error::ApiError;
use crate::platform::Platform;
use serde_json::Value;
use std::time::Duration;

/// Delay between token eviction and the login redirect.
pub(crate) const LOGIN_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Parse the response envelope, tolerating junk on non-200 statuses.
fn parse_envelope(raw: &RawResponse) -> Result<ApiEnvelope, serde_json::Error> {
    serde_json::from_str(&raw.body)
}

/// Classify one response, firing each required side effect at most once.
///
/// Returns the envelope's `data` payload on business success.
pub(crate) fn classify(
    raw: RawResponse,
    show_error: bool,
    platform: &Platform,
) -> Result<Value, ApiError> {
    match raw.status {
        200 => match parse_envelope(&raw) {
            Ok(envelope) if envelope.code == 0 => Ok(envelope.data.unwrap_or(Value::Null)),
            Ok(envelope) => {
                if show_error {
                    let message = if envelope.message.is_empty() {
                        "request failed"
                    } else {
                        envelope.message.as_str()
                    };
                    platform.notifier.notify(message);
                }
                Err(ApiError::Business {
                    code: envelope.code,
                    message: envelope.message,
                })
            }
            Err(e) => Err(ApiError::Transport {
                status: Some(200),
                message: format!("invalid response payload: {e}"),
            }),
        },

        401 => {
            platform.notifier.notify("session expired");
            platform.credentials.evict_token();
            let navigator = platform.navigator.clone();
            tokio::spawn(async move {
                tokio::time::sleep(LOGIN_REDIRECT_DELAY).await;
                navigator.redirect_to_login();
            });
            Err(ApiError::AuthExpired)
        }

        404 => {
            let message = parse_envelope(&raw)
                .map(|envelope| envelope.message)
                .unwrap_or_default();
            Err(ApiError::NotFound { message })
        }

        other => {
            if show_error {
                platform.notifier.notify(&format!("request failed: {other}"));
            }
            let message = parse_envelope(&raw)
                .ok()
                .filter(|envelope| !envelope.message.is_empty())
                .map(|envelope| envelope.message)
                .unwrap_or_else(|| format!("unexpected status {other}"));
            Err(ApiError::Transport {
                status: Some(other),
                message,
            })
        }
    }
}
