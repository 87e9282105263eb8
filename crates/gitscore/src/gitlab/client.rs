//! GitLab client construction and endpoints.

use std::collections::HashSet;
use std::sync::Arc;

use crate::api::{
    ApiClient, ApiError, Auth, ClientOptions, DEFAULT_PER_PAGE, FetchOutcome, MediaType,
    PageRequest, RequestStats, encode_query_value, short_error_message,
};
use crate::http::HttpTransport;

use super::types::{GitLabCommit, GitLabEvent, GitLabProject, GitLabUser};

/// Default GitLab host.
pub const GITLAB_HOST: &str = "gitlab.com";

/// Projects found through a user's push events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushedProjects {
    /// `(project id, project name)` in discovery order.
    pub projects: Vec<(u64, String)>,
    /// Name of the first event author seen, used to filter commits.
    pub author_name: Option<String>,
}

/// Base API URL for a host such as `gitlab.com` or `https://gitlab.example.com/`.
///
/// A bare host gets `https://`.
pub fn api_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("https://") || host.starts_with("http://") {
        format!("{host}/api/v4")
    } else {
        format!("https://{host}/api/v4")
    }
}

/// GitLab REST client.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    api: ApiClient,
    per_page: u32,
}

impl GitLabClient {
    /// Create a client for `host` authenticated with a personal access token.
    pub fn new(host: &str, token: &str, options: ClientOptions) -> Result<Self, ApiError> {
        Ok(Self::from_api(ApiClient::new(
            &api_base_url(host),
            auth_for(token),
            options,
        )?))
    }

    pub fn with_transport(
        host: &str,
        token: &str,
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ApiError> {
        Ok(Self::from_api(ApiClient::new_with_transport(
            &api_base_url(host),
            auth_for(token),
            options,
            transport,
        )?))
    }

    pub fn from_api(api: ApiClient) -> Self {
        Self {
            api,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Look up a user by username. `None` when no user matches.
    pub async fn find_user(
        &self,
        username: &str,
        stats: &mut RequestStats,
    ) -> Result<Option<GitLabUser>, ApiError> {
        let url = self
            .api
            .url(&format!("/users?username={}", encode_query_value(username)));
        let users: Vec<GitLabUser> = self.api.get_json(&url, MediaType::Json, stats).await?;
        Ok(users.into_iter().next())
    }

    /// `GET /projects/{id}`.
    pub async fn project(
        &self,
        project_id: u64,
        stats: &mut RequestStats,
    ) -> Result<GitLabProject, ApiError> {
        let url = self.api.url(&format!("/projects/{project_id}"));
        self.api.get_json(&url, MediaType::Json, stats).await
    }

    /// Projects the user pushed to, up to `repo_limit`.
    ///
    /// Walks the push events page by page and fetches each unseen project as
    /// it appears. A project that cannot be fetched is logged and left out.
    pub async fn discover_pushed_projects(
        &self,
        user_id: u64,
        repo_limit: usize,
        stats: &mut RequestStats,
    ) -> Result<PushedProjects, ApiError> {
        let mut found = PushedProjects::default();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut page = 1u32;

        while found.projects.len() < repo_limit {
            let url = self.api.url(&format!(
                "/users/{user_id}/events?action=pushed&per_page={}&page={page}",
                self.per_page
            ));
            let events: Vec<GitLabEvent> =
                match self.api.fetch_json(&url, MediaType::Json, stats).await? {
                    FetchOutcome::Data(events) => events,
                    FetchOutcome::Skip => break,
                };
            let count = events.len();
            tracing::debug!(user_id, page, count, "Fetched push events");

            for event in &events {
                if found.author_name.is_none()
                    && let Some(name) = event.author_name()
                {
                    found.author_name = Some(name.to_string());
                }

                let Some(project_id) = event.project_id else {
                    continue;
                };
                if !seen.insert(project_id) {
                    continue;
                }

                match self.project(project_id, stats).await {
                    Ok(project) => found.projects.push((project_id, project.name)),
                    Err(e) if e.is_rate_limited() => return Err(e),
                    Err(e) => {
                        tracing::warn!(
                            project_id,
                            error = %short_error_message(&e),
                            "Error fetching project info"
                        );
                    }
                }
                if found.projects.len() >= repo_limit {
                    break;
                }
            }

            if (count as u64) < u64::from(self.per_page) {
                break;
            }
            page += 1;
        }

        tracing::info!(
            user_id,
            count = found.projects.len(),
            "Discovered projects with pushes"
        );
        Ok(found)
    }

    /// Commits in a project authored by `author_name`, across all pages.
    pub async fn count_commits_by_author(
        &self,
        project_id: u64,
        author_name: &str,
        stats: &mut RequestStats,
    ) -> Result<u64, ApiError> {
        let author = encode_query_value(author_name);
        let per_page = self.per_page;
        let api = &self.api;
        let request = PageRequest::new("project commits", |page| {
            api.url(&format!(
                "/projects/{project_id}/repository/commits?author={author}&per_page={per_page}&page={page}"
            ))
        })
        .with_per_page(per_page)
        .with_accept(MediaType::Json);

        let commits: Vec<GitLabCommit> = self.api.paginate_all(&request, stats).await?;
        Ok(commits.len() as u64)
    }
}

fn auth_for(token: &str) -> Auth {
    if token.is_empty() {
        Auth::None
    } else {
        Auth::PrivateToken(token.to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::http::{HttpResponse, MockTransport};

    pub const HOST: &str = "https://gitlab.test";
    pub const BASE: &str = "https://gitlab.test/api/v4";

    pub fn client(transport: &MockTransport) -> GitLabClient {
        GitLabClient::with_transport(
            HOST,
            "glpat-test",
            ClientOptions::default(),
            Arc::new(transport.clone()),
        )
        .expect("client should build")
    }

    pub fn ok(body: impl Into<String>) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.into().into_bytes(),
        }
    }

    pub fn status(code: u16) -> HttpResponse {
        HttpResponse {
            status: code,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn project_json(id: u64, name: &str, stars: u64, forks: u64) -> String {
        format!(
            r#"{{"id":{id},"name":"{name}","path_with_namespace":"group/{name}","star_count":{stars},"forks_count":{forks}}}"#
        )
    }

    pub fn event_json(project_id: u64, author: &str) -> String {
        format!(r#"{{"action_name":"pushed to","project_id":{project_id},"author":{{"name":"{author}"}}}}"#)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::http::{MockTransport, header_get};

    #[test]
    fn base_url_from_host() {
        assert_eq!(api_base_url("gitlab.com"), "https://gitlab.com/api/v4");
        assert_eq!(
            api_base_url("https://gitlab.example.com/"),
            "https://gitlab.example.com/api/v4"
        );
        assert_eq!(api_base_url("http://localhost:8080"), "http://localhost:8080/api/v4");
    }

    #[tokio::test]
    async fn find_user_sends_private_token() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/users?username=jdoe"),
            ok(r#"[{"id":99,"username":"jdoe","name":"Jane Doe"}]"#),
        );
        transport.push_response(format!("{BASE}/users?username=ghost"), ok("[]"));

        let client = client(&transport);
        let mut stats = RequestStats::new();
        let user = client
            .find_user("jdoe", &mut stats)
            .await
            .expect("lookup")
            .expect("user exists");
        assert_eq!(user.id, 99);
        assert!(client.find_user("ghost", &mut stats).await.expect("lookup").is_none());

        let requests = transport.requests();
        assert_eq!(
            header_get(&requests[0].headers, "private-token"),
            Some("glpat-test")
        );
        assert_eq!(
            header_get(&requests[0].headers, "accept"),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn discovery_fetches_each_project_once_and_stops_at_limit() {
        let transport = MockTransport::new();
        let events_url = |page: u32| format!("{BASE}/users/99/events?action=pushed&per_page=3&page={page}");
        transport.push_response(
            events_url(1),
            ok(format!(
                "[{},{},{}]",
                event_json(10, "Jane Doe"),
                event_json(10, "Jane Doe"),
                event_json(11, "Someone Else")
            )),
        );
        transport.push_response(
            events_url(2),
            ok(format!("[{},{},{}]", event_json(12, "x"), event_json(13, "x"), event_json(14, "x"))),
        );
        transport.push_response(format!("{BASE}/projects/10"), ok(project_json(10, "alpha", 1, 0)));
        transport.push_response(format!("{BASE}/projects/11"), status(404));
        transport.push_response(format!("{BASE}/projects/12"), ok(project_json(12, "beta", 0, 0)));
        transport.push_response(format!("{BASE}/projects/13"), ok(project_json(13, "gamma", 0, 0)));

        let found = client(&transport)
            .with_per_page(3)
            .discover_pushed_projects(99, 3, &mut RequestStats::new())
            .await
            .expect("discovery");

        assert_eq!(
            found.projects,
            vec![
                (10, "alpha".to_string()),
                (12, "beta".to_string()),
                (13, "gamma".to_string())
            ]
        );
        assert_eq!(found.author_name.as_deref(), Some("Jane Doe"));
        assert_eq!(transport.request_count(&format!("{BASE}/projects/10")), 1);
        assert_eq!(transport.request_count(&format!("{BASE}/projects/14")), 0);
        assert_eq!(transport.request_count(&events_url(3)), 0);
    }

    #[tokio::test]
    async fn commit_count_sums_pages_with_encoded_author() {
        let transport = MockTransport::new();
        let url = |page: u32| {
            format!("{BASE}/projects/10/repository/commits?author=Jane+Doe&per_page=2&page={page}")
        };
        transport.push_response(url(1), ok(r#"[{"id":"a"},{"id":"b"}]"#));
        transport.push_response(url(2), ok(r#"[{"id":"c"}]"#));

        let count = client(&transport)
            .with_per_page(2)
            .count_commits_by_author(10, "Jane Doe", &mut RequestStats::new())
            .await
            .expect("count");
        assert_eq!(count, 3);
    }
}
