//! Request descriptors, authorization schemes, and media types.

use std::fmt;
use std::time::Duration;

use crate::http::{HttpHeaders, HttpRequest};

/// Authorization scheme sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// Legacy GitHub scheme, `Authorization: token <token>`.
    Token(String),
    /// GitLab personal access token header, `PRIVATE-TOKEN: <token>`.
    PrivateToken(String),
    /// Unauthenticated requests.
    None,
}

impl Auth {
    /// The header this scheme contributes, if any.
    #[must_use]
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            Auth::Bearer(token) => Some(("Authorization".to_string(), format!("Bearer {token}"))),
            Auth::Token(token) => Some(("Authorization".to_string(), format!("token {token}"))),
            Auth::PrivateToken(token) => Some(("PRIVATE-TOKEN".to_string(), token.clone())),
            Auth::None => None,
        }
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self {
            Auth::Bearer(_) => "Bearer",
            Auth::Token(_) => "Token",
            Auth::PrivateToken(_) => "PrivateToken",
            Auth::None => "None",
        };
        write!(f, "Auth::{scheme}")
    }
}

/// Content negotiation for the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    /// `application/vnd.github.v3+json`
    #[default]
    GitHubV3,
    /// `application/vnd.github.cloak-preview`, required by commit search.
    GitHubCommitSearch,
    /// `application/json`
    Json,
}

impl MediaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::GitHubV3 => "application/vnd.github.v3+json",
            MediaType::GitHubCommitSearch => "application/vnd.github.cloak-preview",
            MediaType::Json => "application/json",
        }
    }
}

/// Percent-encode a value for use inside a query string.
#[must_use]
pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// One logical API call.
///
/// Created per call, mutated only by [`RequestDescriptor::next_retry`], and
/// dropped once the call produces an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: String,
    pub accept: MediaType,
    pub timeout: Option<Duration>,
    retry: u32,
}

impl RequestDescriptor {
    #[must_use]
    pub fn get(url: impl Into<String>, accept: MediaType, timeout: Option<Duration>) -> Self {
        Self {
            url: url.into(),
            accept,
            timeout,
            retry: 0,
        }
    }

    /// Number of retries already spent on this call.
    #[must_use]
    pub fn retry(&self) -> u32 {
        self.retry
    }

    /// Move to the next retry. The counter only ever goes up.
    pub fn next_retry(&mut self) {
        self.retry += 1;
    }

    /// Build the transport request for the current attempt.
    #[must_use]
    pub fn to_http_request(&self, auth: &Auth, user_agent: &str) -> HttpRequest {
        let mut headers: HttpHeaders = vec![
            ("Accept".to_string(), self.accept.as_str().to_string()),
            ("User-Agent".to_string(), user_agent.to_string()),
        ];
        if let Some(header) = auth.header() {
            headers.push(header);
        }

        HttpRequest {
            url: self.url.clone(),
            headers,
        }
    }
}
