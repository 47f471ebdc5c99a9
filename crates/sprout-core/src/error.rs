//! Error types for the Sprout client.
//!
//! Request failures carry an explicit kind discriminant so callers can react
//! to the class of failure (absence, expired session, server rejection)
//! without inspecting strings.

use thiserror::Error;

/// Top-level error type for Sprout operations.
#[derive(Error, Debug)]
pub enum SproutError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request/transport errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Classified outcome of a failed API call.
///
/// The classifier maps every raw response onto exactly one of the first four
/// variants; the retry controller wraps the last of them in `RetryExhausted`
/// once the attempt budget is spent.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network failure, timeout, or an unexpected HTTP status
    #[error("transport failure{}: {message}", fmt_status(.status))]
    Transport {
        /// HTTP status, when the failure happened after a response arrived
        status: Option<u16>,
        message: String,
    },

    /// The server answered 200 but rejected the request (envelope code != 0)
    #[error("server rejected request (code {code}): {message}")]
    Business { code: i32, message: String },

    /// 401: the persisted session is no longer valid
    #[error("session expired")]
    AuthExpired,

    /// 404: callers that expect absence treat this as "absent, not broken"
    #[error("not found: {message}")]
    NotFound { message: String },

    /// All attempts failed; carries the last classified error
    #[error("request failed after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl ApiError {
    /// The underlying classified error, looking through `RetryExhausted`.
    pub fn root(&self) -> &ApiError {
        match self {
            ApiError::RetryExhausted { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the root cause is a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), ApiError::NotFound { .. })
    }

    /// True when the root cause is a business rejection (code != 0 at 200).
    pub fn is_business(&self) -> bool {
        matches!(self.root(), ApiError::Business { .. })
    }

    /// True when the root cause is an expired session.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self.root(), ApiError::AuthExpired)
    }
}

/// Convenience type alias for Sprout results.
pub type Result<T> = std::result::Result<T, SproutError>;

/// Convenience type alias for API-call results.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_looks_through_retry_exhausted() {
        let err = ApiError::RetryExhausted {
            attempts: 3,
            source: Box::new(ApiError::NotFound {
                message: "no tips for date".into(),
            }),
        };
        assert!(matches!(err.root(), ApiError::NotFound { .. }));
        assert!(err.is_not_found());
        assert!(!err.is_business());
    }

    #[test]
    fn test_root_of_unwrapped_error_is_itself() {
        let err = ApiError::AuthExpired;
        assert!(err.is_auth_expired());
        assert!(matches!(err.root(), ApiError::AuthExpired));
    }

    #[test]
    fn test_nested_wrapping_resolves_to_innermost() {
        // A retried retry wrapper should still expose the original cause.
        let inner = ApiError::Business {
            code: 4001,
            message: "baby not registered".into(),
        };
        let err = ApiError::RetryExhausted {
            attempts: 1,
            source: Box::new(ApiError::RetryExhausted {
                attempts: 2,
                source: Box::new(inner),
            }),
        };
        assert!(err.is_business());
    }

    #[test]
    fn test_transport_display_includes_status() {
        let err = ApiError::Transport {
            status: Some(503),
            message: "service unavailable".into(),
        };
        assert!(err.to_string().contains("503"));

        let err = ApiError::Transport {
            status: None,
            message: "connection refused".into(),
        };
        assert!(!err.to_string().contains("HTTP"));
    }
}
