//! GitHub client construction and single-resource endpoints.

use std::sync::Arc;

use crate::api::{
    ApiClient, ApiError, Auth, ClientOptions, DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, FetchOutcome,
    MediaType, RequestStats,
};
use crate::http::HttpTransport;

use super::types::{CommitDetail, CommitSummary, Contributor, RateLimitStatus, Repository, TrafficViews};

/// Public GitHub REST API.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub REST client.
///
/// Thin wrapper around [`ApiClient`] that knows GitHub's routes and media
/// types. Every method threads the caller's [`RequestStats`].
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api: ApiClient,
    per_page: u32,
    max_search_pages: u32,
}

impl GitHubClient {
    /// Create a client for `api.github.com`.
    ///
    /// An empty token sends unauthenticated requests.
    pub fn new(token: &str, options: ClientOptions) -> Result<Self, ApiError> {
        Self::with_base_url(GITHUB_API_URL, token, options)
    }

    /// Create a client for a GitHub Enterprise or mock base URL.
    pub fn with_base_url(base_url: &str, token: &str, options: ClientOptions) -> Result<Self, ApiError> {
        Ok(Self::from_api(ApiClient::new(base_url, auth_for(token), options)?))
    }

    pub fn with_transport(
        base_url: &str,
        token: &str,
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ApiError> {
        Ok(Self::from_api(ApiClient::new_with_transport(
            base_url,
            auth_for(token),
            options,
            transport,
        )?))
    }

    pub fn from_api(api: ApiClient) -> Self {
        Self {
            api,
            per_page: DEFAULT_PER_PAGE,
            max_search_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Override the page size and the commit-search page cap.
    #[must_use]
    pub fn with_paging(mut self, per_page: u32, max_search_pages: u32) -> Self {
        self.per_page = per_page.max(1);
        self.max_search_pages = max_search_pages.max(1);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn max_search_pages(&self) -> u32 {
        self.max_search_pages
    }

    /// `GET /repositories/{id}`.
    pub async fn get_repository_by_id(
        &self,
        id: u64,
        stats: &mut RequestStats,
    ) -> Result<Repository, ApiError> {
        let url = self.api.url(&format!("/repositories/{id}"));
        self.api.get_json(&url, MediaType::GitHubV3, stats).await
    }

    /// `GET /repos/{owner}/{repo}`.
    pub async fn get_repository(
        &self,
        owner: &str,
        repo: &str,
        stats: &mut RequestStats,
    ) -> Result<Repository, ApiError> {
        let url = self.api.url(&format!("/repos/{owner}/{repo}"));
        self.api.get_json(&url, MediaType::GitHubV3, stats).await
    }

    /// Traffic views for a repository.
    ///
    /// Requires push access, so a plain 403 is answered on the first attempt
    /// with `None`. A throttled first attempt falls back to the retrying
    /// fetch, and only exhausting that is an error.
    pub async fn traffic_views(
        &self,
        owner: &str,
        repo: &str,
        stats: &mut RequestStats,
    ) -> Result<Option<TrafficViews>, ApiError> {
        let url = self.api.url(&format!("/repos/{owner}/{repo}/traffic/views"));
        let first = self
            .api
            .fetch_without_retry(&url, MediaType::GitHubV3, stats)
            .await;

        let outcome = match first {
            Err(ApiError::RateLimitExhausted { ref last_signal, .. })
                if last_signal.is_throttled() =>
            {
                match self.api.fetch(&url, MediaType::GitHubV3, stats).await {
                    Err(e) if e.is_rate_limited() => return Err(e),
                    other => other,
                }
            }
            other => other,
        };

        match outcome.and_then(|o| match o {
            FetchOutcome::Data(response) => response.json::<TrafficViews>().map(Some),
            FetchOutcome::Skip => Ok(None),
        }) {
            Ok(views) => Ok(views),
            Err(e) => {
                tracing::debug!(repo = %format!("{owner}/{repo}"), error = %e, "Traffic views unavailable");
                Ok(None)
            }
        }
    }

    /// Number of contributors listed for a repository.
    pub async fn contributors_count(
        &self,
        owner: &str,
        repo: &str,
        stats: &mut RequestStats,
    ) -> Result<u64, ApiError> {
        let url = self.api.url(&format!("/repos/{owner}/{repo}/contributors"));
        match self.api.fetch(&url, MediaType::GitHubV3, stats).await? {
            // Empty repositories answer 204 with no body.
            FetchOutcome::Data(response) if response.body.is_empty() => Ok(0),
            FetchOutcome::Data(response) => {
                let contributors: Vec<Contributor> = response.json()?;
                Ok(contributors.len() as u64)
            }
            FetchOutcome::Skip => Ok(0),
        }
    }

    /// Commits by `user` on `branch`. An empty repository yields no commits.
    pub async fn commits_by_author(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        user: &str,
        stats: &mut RequestStats,
    ) -> Result<Vec<CommitSummary>, ApiError> {
        let url = self.api.url(&format!(
            "/repos/{owner}/{repo}/commits?author={}&sha={}",
            crate::api::encode_query_value(user),
            crate::api::encode_query_value(branch),
        ));
        Ok(self
            .api
            .fetch_json(&url, MediaType::GitHubV3, stats)
            .await?
            .into_data()
            .unwrap_or_default())
    }

    /// `GET /repos/{owner}/{repo}/commits/{sha}` with stats and changed files.
    pub async fn commit_detail(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        stats: &mut RequestStats,
    ) -> Result<CommitDetail, ApiError> {
        let url = self.api.url(&format!("/repos/{owner}/{repo}/commits/{sha}"));
        self.api.get_json(&url, MediaType::GitHubV3, stats).await
    }

    /// Core and search quotas.
    pub async fn rate_limit_status(
        &self,
        stats: &mut RequestStats,
    ) -> Result<RateLimitStatus, ApiError> {
        let url = self.api.url("/rate_limit");
        self.api.get_json(&url, MediaType::GitHubV3, stats).await
    }
}

fn auth_for(token: &str) -> Auth {
    if token.is_empty() {
        Auth::None
    } else {
        Auth::Bearer(token.to_string())
    }
}
