//! Resilient REST client shared by the GitHub and GitLab consumers.
//!
//! One logical call ends in exactly one of three states: data, skip (409), or
//! error. Rate-limit responses (403/429) loop back to a new attempt after a
//! backoff wait, bounded by [`ClientOptions::max_retries`].

mod client;
mod error;
mod pagination;
mod rate_limit;
mod request;

pub use client::{
    ApiClient, ApiResponse, ClientOptions, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT,
    DEFAULT_USER_AGENT, FetchOutcome, RequestStats,
};
pub use error::{ApiError, short_error_message};
pub use pagination::{DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, PagePayload, PageRequest, SearchPage};
pub use rate_limit::{
    Backoff, BackoffReason, HEADER_REMAINING, HEADER_RESET, HEADER_RETRY_AFTER, RateLimitSignal,
    exponential_wait,
};
pub use request::{Auth, MediaType, RequestDescriptor, encode_query_value};
