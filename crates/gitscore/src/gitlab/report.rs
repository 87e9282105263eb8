//! GitLab activity report.

use serde::Serialize;

use crate::api::{ApiError, RequestStats, short_error_message};

use super::client::GitLabClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectActivity {
    pub id: u64,
    pub name: String,
    pub path_with_namespace: String,
    pub commits: u64,
    pub stars: u64,
    pub forks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFailure {
    pub id: u64,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitLabActivityReport {
    pub username: String,
    pub user_id: Option<u64>,
    /// Author name commits were filtered by.
    pub author_name: Option<String>,
    pub projects: Vec<ProjectActivity>,
    pub failures: Vec<ProjectFailure>,
}

impl GitLabActivityReport {
    /// Whether the user lookup found nobody.
    pub fn user_not_found(&self) -> bool {
        self.user_id.is_none()
    }

    /// The name shown in "Commits by …" lines.
    pub fn display_author(&self) -> &str {
        self.author_name.as_deref().unwrap_or(&self.username)
    }
}

impl GitLabClient {
    /// Commits, stars, and forks for projects `username` pushed to.
    ///
    /// Projects are visited in name order. Without an author name from the
    /// push events, commit counts are zero. GitLab exposes no view counts.
    pub async fn activity_report(
        &self,
        username: &str,
        repo_limit: usize,
        stats: &mut RequestStats,
    ) -> Result<GitLabActivityReport, ApiError> {
        let mut report = GitLabActivityReport {
            username: username.to_string(),
            ..Default::default()
        };

        let Some(user) = self.find_user(username, stats).await? else {
            tracing::warn!(username, "User not found on GitLab");
            return Ok(report);
        };
        tracing::info!(username, id = user.id, "User found on GitLab");
        report.user_id = Some(user.id);

        let mut discovered = self
            .discover_pushed_projects(user.id, repo_limit, stats)
            .await?;
        report.author_name = discovered.author_name.take();
        discovered.projects.sort_by(|a, b| {
            a.1.to_lowercase()
                .cmp(&b.1.to_lowercase())
                .then_with(|| a.1.cmp(&b.1))
        });

        for (id, name) in discovered.projects {
            let outcome = self
                .project_activity(id, report.author_name.as_deref(), stats)
                .await;
            match outcome {
                Ok(row) => {
                    tracing::info!(
                        id,
                        name = %row.name,
                        commits = row.commits,
                        stars = row.stars,
                        forks = row.forks,
                        "Project activity"
                    );
                    report.projects.push(row);
                }
                Err(e) => {
                    let stop = e.is_rate_limited();
                    tracing::warn!(id, name = %name, error = %short_error_message(&e), "Skipping project");
                    report.failures.push(ProjectFailure {
                        id,
                        name,
                        error: short_error_message(&e),
                    });
                    if stop {
                        break;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn project_activity(
        &self,
        id: u64,
        author_name: Option<&str>,
        stats: &mut RequestStats,
    ) -> Result<ProjectActivity, ApiError> {
        let project = self.project(id, stats).await?;
        let commits = match author_name {
            Some(author) => self.count_commits_by_author(id, author, stats).await?,
            None => 0,
        };

        Ok(ProjectActivity {
            id,
            name: project.name,
            path_with_namespace: project.path_with_namespace,
            commits,
            stars: project.star_count,
            forks: project.forks_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::test_support::*;
    use crate::api::RequestStats;
    use crate::http::MockTransport;

    #[tokio::test]
    async fn report_for_unknown_user_is_empty() {
        let transport = MockTransport::new();
        transport.push_response(format!("{BASE}/users?username=ghost"), ok("[]"));

        let report = client(&transport)
            .activity_report("ghost", 5, &mut RequestStats::new())
            .await
            .expect("report");
        assert!(report.user_not_found());
        assert!(report.projects.is_empty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn report_sorts_projects_and_counts_commits() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/users?username=jdoe"),
            ok(r#"[{"id":99,"username":"jdoe","name":"Jane Doe"}]"#),
        );
        transport.push_response(
            format!("{BASE}/users/99/events?action=pushed&per_page=100&page=1"),
            ok(format!("[{},{}]", event_json(2, "Jane Doe"), event_json(1, "Jane Doe"))),
        );
        // Discovery fetch, then the report fetch.
        for _ in 0..2 {
            transport.push_response(format!("{BASE}/projects/1"), ok(project_json(1, "zulu", 4, 1)));
            transport.push_response(format!("{BASE}/projects/2"), ok(project_json(2, "Alpha", 0, 2)));
        }
        transport.push_response(
            format!("{BASE}/projects/1/repository/commits?author=Jane+Doe&per_page=100&page=1"),
            ok(r#"[{"id":"a"},{"id":"b"}]"#),
        );
        transport.push_response(
            format!("{BASE}/projects/2/repository/commits?author=Jane+Doe&per_page=100&page=1"),
            ok("[]"),
        );

        let mut stats = RequestStats::new();
        let report = client(&transport)
            .activity_report("jdoe", 5, &mut stats)
            .await
            .expect("report");

        assert_eq!(report.display_author(), "Jane Doe");
        let names: Vec<&str> = report.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zulu"]);
        assert_eq!(report.projects[1].commits, 2);
        assert_eq!(report.projects[1].stars, 4);
        assert_eq!(report.projects[0].commits, 0);
        assert_eq!(stats.requests, 8);
    }
}
