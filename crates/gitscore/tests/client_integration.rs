//! Integration tests for the resilient client and the GitHub/GitLab consumers.
//!
//! Every test drives the public API through a scripted transport on paused
//! tokio time, so backoff waits cost nothing and elapsed time is exact.
//!
//! Key scenarios tested:
//! - Retry-after and exhausted-quota waits before reissuing a request
//! - The 6-attempt ceiling on persistent rate limiting
//! - Page-size based pagination stop
//! - End-to-end reports with request statistics

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gitscore::api::{
    ApiClient, ApiError, Auth, ClientOptions, FetchOutcome, MediaType, PageRequest, RequestStats,
};
use gitscore::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use tokio::time::Instant;

/// Replays canned responses per URL in FIFO order and records every request.
#[derive(Clone, Default)]
struct ScriptedTransport {
    routes: Arc<Mutex<HashMap<String, VecDeque<HttpResponse>>>>,
    log: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    fn respond(&self, url: impl Into<String>, status: u16, headers: &[(&str, &str)], body: &str) {
        let response = HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.as_bytes().to_vec(),
        };
        self.routes
            .lock()
            .expect("routes lock")
            .entry(url.into())
            .or_default()
            .push_back(response);
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.log.lock().expect("log lock").clone()
    }

    fn sent_to(&self, url: &str) -> usize {
        self.sent().iter().filter(|r| r.url == url).count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.log.lock().expect("log lock").push(request.clone());
        self.routes
            .lock()
            .expect("routes lock")
            .get_mut(&request.url)
            .and_then(|q| q.pop_front())
            .ok_or(HttpError::NoMockResponse { url: request.url })
    }
}

const BASE: &str = "https://api.forge.test";

fn api(transport: &ScriptedTransport) -> ApiClient {
    ApiClient::new_with_transport(
        BASE,
        Auth::Token("secret".to_string()),
        ClientOptions::default(),
        Arc::new(transport.clone()),
    )
    .expect("client should build")
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[tokio::test(start_paused = true)]
async fn retry_after_reissues_identical_request_once() {
    let transport = ScriptedTransport::default();
    let url = format!("{BASE}/search/commits?q=author%3Aoctocat&per_page=100&page=1");
    transport.respond(&url, 429, &[("retry-after", "2")], "");
    transport.respond(&url, 200, &[], r#"{"total_count":0,"items":[]}"#);

    let start = Instant::now();
    let mut stats = RequestStats::new();
    let outcome = api(&transport)
        .fetch(&url, MediaType::GitHubCommitSearch, &mut stats)
        .await
        .expect("second attempt succeeds");

    assert!(matches!(outcome, FetchOutcome::Data(_)));
    assert_eq!(start.elapsed(), Duration::from_secs(2));
    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.retries, 1);
}

#[tokio::test(start_paused = true)]
async fn six_exhausted_quota_responses_end_in_terminal_error() {
    let transport = ScriptedTransport::default();
    let url = format!("{BASE}/repos/octo/hello");
    for _ in 0..7 {
        let reset = (unix_now() + 1).to_string();
        transport.respond(
            &url,
            403,
            &[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", &reset)],
            r#"{"message":"API rate limit exceeded"}"#,
        );
    }

    let err = api(&transport)
        .fetch(&url, MediaType::GitHubV3, &mut RequestStats::new())
        .await
        .expect_err("retries exhausted");

    assert_eq!(transport.sent_to(&url), 6);
    assert!(err.is_rate_limited());
    assert!(err.to_string().contains(&url));
}

#[tokio::test(start_paused = true)]
async fn server_error_is_not_retried() {
    let transport = ScriptedTransport::default();
    let url = format!("{BASE}/repos/octo/hello");
    transport.respond(&url, 500, &[], "oops");

    let start = Instant::now();
    let err = api(&transport)
        .fetch(&url, MediaType::GitHubV3, &mut RequestStats::new())
        .await
        .expect_err("500 fails");

    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(transport.sent_to(&url), 1);
}

#[tokio::test(start_paused = true)]
async fn conflict_is_skip_regardless_of_retry_count() {
    let transport = ScriptedTransport::default();
    let url = format!("{BASE}/repos/octo/empty/commits");
    for _ in 0..5 {
        transport.respond(&url, 403, &[], "");
    }
    transport.respond(&url, 409, &[], r#"{"message":"Git Repository is empty."}"#);

    let outcome = api(&transport)
        .fetch_json::<serde_json::Value>(&url, MediaType::GitHubV3, &mut RequestStats::new())
        .await
        .expect("409 is not an error");

    assert!(outcome.is_skip());
    assert_eq!(transport.sent_to(&url), 6);
}

#[tokio::test]
async fn pagination_stops_after_short_page() {
    let transport = ScriptedTransport::default();
    let page = |n: u32| format!("{BASE}/users/octocat/repos?per_page=100&page={n}");
    let full: Vec<u32> = (0..100).collect();
    let short: Vec<u32> = (100..137).collect();
    transport.respond(page(1), 200, &[], &serde_json::to_string(&full).expect("json"));
    transport.respond(page(2), 200, &[], &serde_json::to_string(&short).expect("json"));
    transport.respond(page(3), 200, &[], "[]");

    let items: Vec<u32> = api(&transport)
        .paginate_all(&PageRequest::new("repos", page), &mut RequestStats::new())
        .await
        .expect("pagination");

    assert_eq!(items.len(), 137);
    assert_eq!(items.first(), Some(&0));
    assert_eq!(items.last(), Some(&136));
    assert_eq!(transport.sent().len(), 2);
}

#[cfg(feature = "github")]
#[tokio::test(start_paused = true)]
async fn github_activity_report_survives_a_secondary_limit() {
    use gitscore::github::GitHubClient;

    let transport = ScriptedTransport::default();
    let search = format!("{BASE}/search/commits?q=author%3Aoctocat&per_page=100&page=1");
    transport.respond(&search, 403, &[], r#"{"message":"secondary rate limit"}"#);
    transport.respond(
        &search,
        200,
        &[],
        r#"{"total_count":1,"items":[{"sha":"a","repository":{"id":7,"name":"hello","full_name":"octo/hello","owner":{"login":"octo"}}}]}"#,
    );
    transport.respond(
        format!("{BASE}/repositories/7"),
        200,
        &[],
        r#"{"id":7,"name":"hello","full_name":"octo/hello","owner":{"login":"octo"},"stargazers_count":3,"forks_count":1}"#,
    );
    transport.respond(
        format!("{BASE}/repos/octo/hello/commits?author=octocat&per_page=1"),
        200,
        &[(
            "link",
            r#"<https://api.forge.test/repositories/7/commits?author=octocat&per_page=1&page=2>; rel="next", <https://api.forge.test/repositories/7/commits?author=octocat&per_page=1&page=12>; rel="last""#,
        )],
        r#"[{"sha":"a"}]"#,
    );
    transport.respond(format!("{BASE}/repos/octo/hello/traffic/views"), 404, &[], "");

    let client = GitHubClient::with_transport(
        BASE,
        "ghp_token",
        ClientOptions::default(),
        Arc::new(transport.clone()),
    )
    .expect("client");

    let start = Instant::now();
    let mut stats = RequestStats::new();
    let report = client
        .activity_report("octocat", 5, &mut stats)
        .await
        .expect("report");

    assert_eq!(start.elapsed(), Duration::from_secs(2));
    assert_eq!(report.repos.len(), 1);
    let row = &report.repos[0];
    assert_eq!((row.commits, row.stars, row.forks, row.views), (12, 3, 1, None));
    assert_eq!(stats.requests, 5);
    assert_eq!(stats.retries, 1);
    assert_eq!(stats.backoff, Duration::from_secs(2));
}

#[cfg(feature = "gitlab")]
#[tokio::test]
async fn gitlab_commit_count_uses_private_token() {
    use gitscore::gitlab::GitLabClient;

    let transport = ScriptedTransport::default();
    let url = "https://gitlab.forge.test/api/v4/projects/5/repository/commits?author=Jane+Doe&per_page=100&page=1";
    transport.respond(url, 200, &[], r#"[{"id":"a"},{"id":"b"}]"#);

    let client = GitLabClient::with_transport(
        "https://gitlab.forge.test",
        "glpat",
        ClientOptions::default(),
        Arc::new(transport.clone()),
    )
    .expect("client");

    let count = client
        .count_commits_by_author(5, "Jane Doe", &mut RequestStats::new())
        .await
        .expect("count");

    assert_eq!(count, 2);
    let sent = transport.sent();
    assert!(
        sent[0]
            .headers
            .iter()
            .any(|(k, v)| k == "PRIVATE-TOKEN" && v == "glpat")
    );
}
