//! Proactive request pacing.
//!
//! Reactive backoff in [`crate::api`] handles limits the server reports. Pacing
//! is the optional other half: spacing requests out so the limits are hit less
//! often in the first place.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default pacing per platform (requests per second).
pub mod rates {
    /// GitHub: 5000 requests/hour core, 30/minute search.
    pub const GITHUB_DEFAULT_RPS: u32 = 10;
    /// GitLab: 2000 requests/minute authenticated.
    pub const GITLAB_DEFAULT_RPS: u32 = 5;
}

/// A request pacer using the governor crate.
///
/// # Example
///
/// ```ignore
/// use gitscore::pacing::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(10); // 10 requests per second
///
/// // Before each API call:
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
    requests_per_second: u32,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// A value of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
            requests_per_second: rps.get(),
        }
    }

    /// Configured requests per second.
    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rps_is_clamped_to_one() {
        let limiter = ApiRateLimiter::new(0);
        assert_eq!(limiter.requests_per_second(), 1);
    }

    #[test]
    fn debug_shows_rate() {
        let limiter = ApiRateLimiter::new(rates::GITLAB_DEFAULT_RPS);
        assert_eq!(
            format!("{limiter:?}"),
            "ApiRateLimiter { requests_per_second: 5 }"
        );
    }

    #[tokio::test]
    async fn first_request_is_allowed_immediately() {
        let limiter = ApiRateLimiter::new(rates::GITHUB_DEFAULT_RPS);
        let start = std::time::Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < std::time::Duration::from_millis(500));
    }
}
