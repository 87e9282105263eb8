//! API client error types.

use std::time::Duration;

use thiserror::Error;

use super::rate_limit::RateLimitSignal;

/// Errors surfaced by [`ApiClient`](super::ApiClient).
///
/// A 409 response is not an error; it resolves to
/// [`FetchOutcome::Skip`](super::FetchOutcome::Skip).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport failed before a response arrived.
    #[error("HTTP request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// No response within the per-attempt deadline.
    #[error("Request to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    /// Non-2xx status other than 403, 409, and 429.
    #[error("Failed to fetch {url}: {status}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Still rate limited after the retry ceiling.
    #[error("Rate limit exceeded for {url}, max retries reached after {attempts} attempts")]
    RateLimitExhausted {
        url: String,
        attempts: u32,
        last_signal: RateLimitSignal,
    },

    /// A 2xx body did not match the expected shape.
    #[error("Invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Create a status error.
    #[inline]
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a transport error.
    #[inline]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// The URL the failing call targeted, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport { url, .. }
            | Self::Timeout { url, .. }
            | Self::Status { url, .. }
            | Self::RateLimitExhausted { url, .. }
            | Self::Json { url, .. } => Some(url),
            Self::Config(_) => None,
        }
    }

    /// The HTTP status that caused the failure, if one was received.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimitExhausted { last_signal, .. } => Some(last_signal.status),
            _ => None,
        }
    }

    /// Check if the call gave up because of rate limiting.
    #[inline]
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExhausted { .. })
    }

    /// Check if the attempt hit its deadline.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which keeps multi-line response
/// bodies out of per-repository log lines.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_url_and_status() {
        let err = ApiError::status("https://api.github.com/repos/a/b", 500, "boom");
        assert_eq!(
            err.to_string(),
            "Failed to fetch https://api.github.com/repos/a/b: 500"
        );
        assert_eq!(err.url(), Some("https://api.github.com/repos/a/b"));
        assert_eq!(err.http_status(), Some(500));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn exhausted_error_names_url() {
        let err = ApiError::RateLimitExhausted {
            url: "https://api.github.com/user".to_string(),
            attempts: 6,
            last_signal: RateLimitSignal {
                status: 403,
                ..Default::default()
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("https://api.github.com/user"));
        assert!(msg.contains("max retries reached"));
        assert!(err.is_rate_limited());
        assert_eq!(err.http_status(), Some(403));
    }

    #[test]
    fn timeout_error_reports_millis() {
        let err = ApiError::Timeout {
            url: "https://gitlab.com/api/v4/users".to_string(),
            timeout: Duration::from_millis(20_000),
        };
        assert!(err.to_string().contains("20000ms"));
        assert!(err.is_timeout());
        assert_eq!(err.http_status(), None);
    }

    #[test]
    fn config_error_has_no_url() {
        let err = ApiError::Config("empty base url".to_string());
        assert_eq!(err.url(), None);
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn short_error_message_takes_first_line() {
        let err = ApiError::transport("https://x.test", "connection reset\nbacktrace...");
        assert_eq!(
            short_error_message(&err),
            "HTTP request to https://x.test failed: connection reset"
        );
    }
}
