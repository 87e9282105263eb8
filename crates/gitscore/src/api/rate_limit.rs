//! Rate-limit detection and backoff computation.
//!
//! A 403 or 429 response is a rate-limit signal. How long to wait before the
//! next attempt depends on which headers the server sent, checked in this order:
//!
//! 1. `x-ratelimit-remaining: 0` with an `x-ratelimit-reset` epoch: wait until
//!    the reset, at least one second.
//! 2. `retry-after: <seconds>`: wait exactly that long.
//! 3. Neither: secondary (abuse) limit, wait `2^(retry + 1)` seconds.
//!
//! Real APIs can send both the primary headers and `retry-after`. The primary
//! branch wins whenever the quota is exhausted and a reset is present.

use std::time::Duration;

use crate::http::HttpResponse;

/// Header carrying the remaining primary quota.
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
/// Header carrying the primary quota reset as epoch seconds.
pub const HEADER_RESET: &str = "x-ratelimit-reset";
/// Header carrying an explicit wait in seconds.
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Rate-limit headers read from a single 403/429 response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitSignal {
    pub status: u16,
    pub remaining: Option<String>,
    pub reset: Option<String>,
    pub retry_after: Option<String>,
}

/// Which branch of the backoff policy produced a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffReason {
    /// Primary quota exhausted; waiting for the reset epoch.
    PrimaryReset { reset_epoch: i64 },
    /// Server asked for an explicit wait.
    RetryAfter,
    /// No guidance; exponential backoff.
    Secondary,
}

/// A computed wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub reason: BackoffReason,
    pub wait: Duration,
}

impl RateLimitSignal {
    /// Whether a status code takes the rate-limit path.
    #[inline]
    #[must_use]
    pub fn is_rate_limit_status(status: u16) -> bool {
        status == 403 || status == 429
    }

    /// Read the rate-limit headers from a response.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Self {
        let read = |name: &str| response.header(name).map(|v| v.trim().to_string());
        Self {
            status: response.status,
            remaining: read(HEADER_REMAINING),
            reset: read(HEADER_RESET),
            retry_after: read(HEADER_RETRY_AFTER),
        }
    }

    /// Whether the primary quota is reported as exhausted.
    #[must_use]
    pub fn quota_exhausted(&self) -> bool {
        self.remaining.as_deref() == Some("0")
    }

    /// Whether the response reports throttling rather than a plain refusal.
    ///
    /// A bare 403 with quota left is how GitHub answers missing permissions.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.status == 429 || self.quota_exhausted() || self.retry_after.is_some()
    }

    fn reset_epoch(&self) -> Option<i64> {
        self.reset.as_deref().and_then(|v| v.parse::<i64>().ok())
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
    }

    /// Compute the wait for a call that has already spent `retry` retries.
    ///
    /// `now_epoch` is the current time in epoch seconds.
    #[must_use]
    pub fn backoff(&self, retry: u32, now_epoch: i64) -> Backoff {
        if self.quota_exhausted()
            && let Some(reset_epoch) = self.reset_epoch()
        {
            let secs = reset_epoch.saturating_sub(now_epoch).max(1);
            return Backoff {
                reason: BackoffReason::PrimaryReset { reset_epoch },
                wait: Duration::from_secs(secs as u64),
            };
        }

        if let Some(secs) = self.retry_after_secs() {
            return Backoff {
                reason: BackoffReason::RetryAfter,
                wait: Duration::from_secs(secs),
            };
        }

        Backoff {
            reason: BackoffReason::Secondary,
            wait: exponential_wait(retry),
        }
    }
}

/// `2^(retry + 1)` seconds, saturating.
#[must_use]
pub fn exponential_wait(retry: u32) -> Duration {
    let secs = 1u64.checked_shl(retry.saturating_add(1)).unwrap_or(u64::MAX);
    Duration::from_secs(secs)
}
