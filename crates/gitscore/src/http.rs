//! Outbound HTTP seam.
//!
//! Everything the forges are asked goes out as a GET built by
//! [`crate::api::RequestDescriptor`] and comes back as status, headers and raw
//! bytes. Status classification happens one layer up in
//! [`crate::api::ApiClient`], so a transport never interprets a response.

use async_trait::async_trait;
use thiserror::Error;

/// Header name/value pairs in wire order. Lookups ignore case.
pub type HttpHeaders = Vec<(String, String)>;

/// A GET request as handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HttpHeaders,
}

/// Status, headers and body of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, TLS or body read failure.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("no canned response left for GET {url}")]
    NoMockResponse { url: String },
}

/// Sends one request and returns whatever the server answered.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// First value of header `name`, ignoring case.
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v.as_str()))
}

pub mod reqwest_transport {
    use std::time::Duration;

    use super::{HttpError, HttpHeaders, HttpRequest, HttpResponse, HttpTransport};
    use async_trait::async_trait;

    /// [`HttpTransport`] over a shared `reqwest::Client`.
    ///
    /// Only connection setup is bounded here. Response deadlines belong to the
    /// API client, which applies them per attempt.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn with_connect_timeout(timeout: Duration) -> Result<Self, HttpError> {
            reqwest::Client::builder()
                .connect_timeout(timeout)
                .build()
                .map(Self::new)
                .map_err(transport_error)
        }
    }

    fn transport_error(e: reqwest::Error) -> HttpError {
        HttpError::Transport(e.to_string())
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let builder = request
                .headers
                .iter()
                .fold(self.client.get(&request.url), |b, (k, v)| b.header(k, v));

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            // Non-ASCII header values are dropped; none of the ones read are.
            let headers: HttpHeaders = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await.map_err(transport_error)?.to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(test)]
pub(crate) use mock::MockTransport;


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            url: url.to_string(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
        }
    }

    fn answer(status: u16, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn header_lookup_ignores_case_and_prefers_first() {
        let headers: HttpHeaders = vec![
            ("Retry-After".to_string(), "2".to_string()),
            ("retry-after".to_string(), "9".to_string()),
        ];
        assert_eq!(header_get(&headers, "RETRY-AFTER"), Some("2"));
        assert_eq!(header_get(&headers, "x-ratelimit-reset"), None);
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(answer(200, b"").is_success());
        assert!(answer(204, b"").is_success());
        assert!(!answer(304, b"").is_success());
        assert!(!answer(409, b"").is_success());
    }

    #[test]
    fn body_text_replaces_invalid_utf8() {
        assert_eq!(answer(200, b"ok").body_text(), "ok");
        assert_eq!(answer(200, &[b'a', 0xff]).body_text(), "a\u{fffd}");
    }

    #[tokio::test]
    async fn mock_answers_in_queue_order_per_url() {
        let transport = MockTransport::new();
        let url = "https://api.example.test/user/repos";
        transport.push_response(url, answer(429, b""));
        transport.push_response(url, answer(200, b"[]"));
        transport.push_response("https://api.example.test/other", answer(404, b""));

        assert_eq!(transport.send(get(url)).await.expect("first").status, 429);
        assert_eq!(transport.send(get(url)).await.expect("second").status, 200);
        assert_eq!(transport.request_count(url), 2);
        assert_eq!(transport.requests()[0], get(url));
    }

    #[tokio::test]
    async fn mock_records_unanswered_requests() {
        let transport = MockTransport::new();
        let url = "https://api.example.test/nothing";

        let err = transport.send(get(url)).await.expect_err("queue is empty");

        assert!(matches!(err, HttpError::NoMockResponse { url: ref u } if u == url));
        assert_eq!(transport.request_count(url), 1);
    }

    #[test]
    fn reqwest_transport_builds_with_connect_timeout() {
        assert!(
            reqwest_transport::ReqwestTransport::with_connect_timeout(Duration::from_secs(10))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn reqwest_transport_reports_bad_urls_as_transport_errors() {
        let transport = reqwest_transport::ReqwestTransport::new(reqwest::Client::new());

        let err = transport
            .send(get("no-scheme/rate_limit"))
            .await
            .expect_err("relative URL cannot be sent");

        assert!(matches!(err, HttpError::Transport(_)));
    }
}
