//! The resilient API client.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::rate_limit::{BackoffReason, RateLimitSignal};
use super::request::{Auth, MediaType, RequestDescriptor};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpResponse, HttpTransport, header_get};
use crate::pacing::ApiRateLimiter;

/// Default per-attempt response deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Default retry ceiling for rate-limited calls (6 attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = "gitscore";

/// Tunables for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-attempt response deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Retries allowed after rate-limit responses.
    pub max_retries: u32,
    /// Optional proactive pacing, in requests per second.
    pub requests_per_second: Option<u32>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            max_retries: DEFAULT_MAX_RETRIES,
            requests_per_second: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the per-attempt deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry ceiling.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enable proactive pacing.
    #[must_use]
    pub fn with_requests_per_second(mut self, rps: Option<u32>) -> Self {
        self.requests_per_second = rps.filter(|r| *r > 0);
        self
    }
}

/// Result of a logical call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// The server answered 2xx.
    Data(T),
    /// The server answered 409: the resource legitimately has no data
    /// (empty repository, unborn branch).
    Skip,
}

impl<T> FetchOutcome<T> {
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// `Some` for data, `None` for skip.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Skip => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Data(data) => FetchOutcome::Data(f(data)),
            Self::Skip => FetchOutcome::Skip,
        }
    }
}

/// A successful (2xx) response together with the URL that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub url: String,
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl ApiResponse {
    fn from_http(url: String, response: HttpResponse) -> Self {
        Self {
            url,
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    /// Decode the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|source| ApiError::Json {
            url: self.url.clone(),
            source,
        })
    }
}

/// Diagnostics accumulated across calls.
///
/// Passed by `&mut` through every call chain instead of living in a global.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    /// HTTP requests issued, retries included.
    pub requests: u64,
    /// Retries caused by rate-limit responses.
    pub retries: u64,
    /// Calls that resolved to [`FetchOutcome::Skip`].
    pub skipped: u64,
    /// Total time spent waiting on rate-limit backoff.
    pub backoff: Duration,
}

impl RequestStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// HTTP client for a single REST API base URL.
///
/// Every call goes through [`ApiClient::fetch`], which owns the retry loop:
///
/// - 403/429: wait as directed by [`RateLimitSignal::backoff`] and retry, up to
///   `max_retries` times.
/// - 409: [`FetchOutcome::Skip`].
/// - other non-2xx: [`ApiError::Status`], no retry.
/// - 2xx: [`FetchOutcome::Data`].
///
/// Transport failures and timeouts are returned as-is; callers decide whether
/// to skip the enclosing unit of work.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    auth: Auth,
    options: ClientOptions,
    pacer: Option<ApiRateLimiter>,
}

impl ApiClient {
    /// Create a client backed by reqwest.
    pub fn new(base_url: &str, auth: Auth, options: ClientOptions) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::with_connect_timeout(Duration::from_secs(10))
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Self::new_with_transport(base_url, auth, options, Arc::new(transport))
    }

    pub fn new_with_transport(
        base_url: &str,
        auth: Auth,
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Config("API base URL must not be empty".to_string()));
        }
        let pacer = options.requests_per_second.map(ApiRateLimiter::new);

        Ok(Self {
            transport,
            base_url,
            auth,
            options,
            pacer,
        })
    }

    /// The base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Absolute URL for an API path such as `/users/octocat/repos`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn pace(&self) {
        if let Some(ref pacer) = self.pacer {
            pacer.wait().await;
        }
    }

    /// Send one attempt, enforcing the per-attempt deadline.
    async fn send_attempt(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse, ApiError> {
        let request = descriptor.to_http_request(&self.auth, &self.options.user_agent);
        let send = self.transport.send(request);

        let result = match descriptor.timeout {
            Some(timeout) => tokio::time::timeout(timeout, send)
                .await
                .map_err(|_| ApiError::Timeout {
                    url: descriptor.url.clone(),
                    timeout,
                })?,
            None => send.await,
        };

        result.map_err(|e| ApiError::transport(&descriptor.url, e.to_string()))
    }

    /// Perform one logical GET, returning the raw 2xx response.
    pub async fn fetch(
        &self,
        url: &str,
        accept: MediaType,
        stats: &mut RequestStats,
    ) -> Result<FetchOutcome<ApiResponse>, ApiError> {
        self.fetch_with_retries(url, accept, self.options.max_retries, stats)
            .await
    }

    /// Like [`ApiClient::fetch`], but a 403/429 fails on the first attempt.
    ///
    /// For endpoints that answer 403 for missing permissions.
    pub async fn fetch_without_retry(
        &self,
        url: &str,
        accept: MediaType,
        stats: &mut RequestStats,
    ) -> Result<FetchOutcome<ApiResponse>, ApiError> {
        self.fetch_with_retries(url, accept, 0, stats).await
    }

    async fn fetch_with_retries(
        &self,
        url: &str,
        accept: MediaType,
        max_retries: u32,
        stats: &mut RequestStats,
    ) -> Result<FetchOutcome<ApiResponse>, ApiError> {
        let mut descriptor = RequestDescriptor::get(url, accept, self.options.timeout);

        loop {
            self.pace().await;
            stats.requests += 1;
            let response = self.send_attempt(&descriptor).await?;

            if RateLimitSignal::is_rate_limit_status(response.status) {
                let signal = RateLimitSignal::from_response(&response);
                let backoff = signal.backoff(descriptor.retry(), Utc::now().timestamp());

                if descriptor.retry() >= max_retries {
                    let attempts = descriptor.retry() + 1;
                    tracing::warn!(
                        url = %descriptor.url,
                        status = signal.status,
                        attempts,
                        "Rate limit exceeded, max retries reached"
                    );
                    return Err(ApiError::RateLimitExhausted {
                        url: descriptor.url,
                        attempts,
                        last_signal: signal,
                    });
                }

                let kind = match backoff.reason {
                    BackoffReason::PrimaryReset { .. } => "primary",
                    BackoffReason::RetryAfter => "retry-after",
                    BackoffReason::Secondary => "secondary",
                };
                tracing::warn!(
                    url = %descriptor.url,
                    status = signal.status,
                    remaining = ?signal.remaining,
                    reset = ?signal.reset,
                    retry_after = ?signal.retry_after,
                    kind,
                    wait_secs = backoff.wait.as_secs(),
                    attempt = descriptor.retry() + 1,
                    "Rate limited, backing off"
                );

                tokio::time::sleep(backoff.wait).await;
                stats.retries += 1;
                stats.backoff += backoff.wait;
                descriptor.next_retry();
                continue;
            }

            if response.status == 409 {
                tracing::debug!(url = %descriptor.url, "Empty resource (409), skipping");
                stats.skipped += 1;
                return Ok(FetchOutcome::Skip);
            }

            if !response.is_success() {
                let body = response.body_text();
                tracing::debug!(url = %descriptor.url, status = response.status, "Request failed");
                return Err(ApiError::status(descriptor.url, response.status, body));
            }

            return Ok(FetchOutcome::Data(ApiResponse::from_http(
                descriptor.url,
                response,
            )));
        }
    }

    /// Perform one logical GET and decode the JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        accept: MediaType,
        stats: &mut RequestStats,
    ) -> Result<FetchOutcome<T>, ApiError> {
        match self.fetch(url, accept, stats).await? {
            FetchOutcome::Data(response) => response.json().map(FetchOutcome::Data),
            FetchOutcome::Skip => Ok(FetchOutcome::Skip),
        }
    }

    /// Like [`ApiClient::fetch_json`], for endpoints where a 409 has no
    /// meaning. A skip becomes a status error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        accept: MediaType,
        stats: &mut RequestStats,
    ) -> Result<T, ApiError> {
        match self.fetch_json(url, accept, stats).await? {
            FetchOutcome::Data(data) => Ok(data),
            FetchOutcome::Skip => Err(ApiError::status(url, 409, "")),
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
