//! Per-repository activity reports and score inputs.
//!
//! Both reports discover repositories through commit search, then visit them
//! one at a time. A repository that fails is recorded and skipped. An
//! exhausted rate limit ends the run early.

use serde::Serialize;

use crate::api::{ApiError, RequestStats, short_error_message};
use crate::score::{ContributionScore, RepoMetrics};

use super::client::GitHubClient;
use super::types::SearchRepository;

/// One row of the activity report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoActivity {
    pub id: u64,
    pub name: String,
    pub owner: String,
    pub commits: u64,
    pub stars: u64,
    pub forks: u64,
    /// `None` when traffic data is not available to the token.
    pub views: Option<u64>,
}

/// A repository that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoFailure {
    pub id: u64,
    pub name: String,
    pub error: String,
}

impl RepoFailure {
    fn new(repo: &SearchRepository, error: &ApiError) -> Self {
        Self {
            id: repo.id,
            name: repo.name.clone(),
            error: short_error_message(error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityReport {
    pub user: String,
    pub repos: Vec<RepoActivity>,
    pub failures: Vec<RepoFailure>,
}

/// Score inputs and result for one repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRepo {
    pub full_name: String,
    pub metrics: RepoMetrics,
    pub score: ContributionScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreReport {
    pub user: String,
    pub repos: Vec<ScoredRepo>,
    pub failures: Vec<RepoFailure>,
}

impl ScoreReport {
    pub fn total(&self) -> u64 {
        self.repos.iter().map(|r| r.score.final_score).sum()
    }

    /// The metrics array, in report order.
    pub fn metrics(&self) -> Vec<RepoMetrics> {
        self.repos.iter().map(|r| r.metrics).collect()
    }
}

fn sort_by_name(repos: &mut [SearchRepository]) {
    repos.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Record a failure. Returns `true` when the run should stop.
fn record_failure(failures: &mut Vec<RepoFailure>, repo: &SearchRepository, error: &ApiError) -> bool {
    let stop = error.is_rate_limited();
    if stop {
        tracing::warn!(id = repo.id, name = %repo.name, error = %short_error_message(error), "Rate limit exhausted, stopping");
    } else {
        tracing::warn!(id = repo.id, name = %repo.name, error = %short_error_message(error), "Skipping repository");
    }
    failures.push(RepoFailure::new(repo, error));
    stop
}

impl GitHubClient {
    /// Commits, stars, forks, and views for repositories `user` committed to.
    ///
    /// Repositories are visited in name order.
    pub async fn activity_report(
        &self,
        user: &str,
        repo_limit: usize,
        stats: &mut RequestStats,
    ) -> Result<ActivityReport, ApiError> {
        let mut discovered = self.discover_commit_repos(user, repo_limit, stats).await?;
        sort_by_name(&mut discovered);

        let mut report = ActivityReport {
            user: user.to_string(),
            ..Default::default()
        };

        for repo in &discovered {
            match self.repo_activity(repo, user, stats).await {
                Ok(row) => {
                    tracing::info!(
                        id = row.id,
                        name = %row.name,
                        commits = row.commits,
                        stars = row.stars,
                        forks = row.forks,
                        views = ?row.views,
                        "Repository activity"
                    );
                    report.repos.push(row);
                }
                Err(e) => {
                    if record_failure(&mut report.failures, repo, &e) {
                        break;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn repo_activity(
        &self,
        repo: &SearchRepository,
        user: &str,
        stats: &mut RequestStats,
    ) -> Result<RepoActivity, ApiError> {
        let info = self.get_repository_by_id(repo.id, stats).await?;
        let owner = info.owner.login;
        let commits = self
            .count_commits_by_author(&owner, &repo.name, user, stats)
            .await?;
        let views = self
            .traffic_views(&owner, &repo.name, stats)
            .await?
            .map(|v| v.count);

        Ok(RepoActivity {
            id: repo.id,
            name: repo.name.clone(),
            owner,
            commits,
            stars: info.stargazers_count,
            forks: info.forks_count,
            views,
        })
    }

    /// Score inputs for repositories `user` committed to, in discovery order.
    pub async fn collect_score_metrics(
        &self,
        user: &str,
        repo_limit: usize,
        stats: &mut RequestStats,
    ) -> Result<ScoreReport, ApiError> {
        let discovered = self.discover_commit_repos(user, repo_limit, stats).await?;

        let mut report = ScoreReport {
            user: user.to_string(),
            ..Default::default()
        };

        for repo in &discovered {
            match self.repo_metrics(repo, user, stats).await {
                Ok(metrics) => {
                    let score = metrics.score();
                    tracing::info!(
                        repo = %repo.full_name,
                        stars = metrics.stars,
                        forks = metrics.forks,
                        contributors = metrics.contributors,
                        commits = metrics.commits_by_user,
                        additions = metrics.total_additions,
                        production_commits = metrics.production_commits,
                        score = score.final_score,
                        "Repository metrics"
                    );
                    report.repos.push(ScoredRepo {
                        full_name: format!("{}/{}", repo.owner.login, repo.name),
                        metrics,
                        score,
                    });
                }
                Err(e) => {
                    if record_failure(&mut report.failures, repo, &e) {
                        break;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn repo_metrics(
        &self,
        repo: &SearchRepository,
        user: &str,
        stats: &mut RequestStats,
    ) -> Result<RepoMetrics, ApiError> {
        let owner = repo.owner.login.as_str();
        let info = self.get_repository(owner, &repo.name, stats).await?;
        let contributors = self.contributors_count(owner, &repo.name, stats).await?;
        let commits = self
            .commits_by_author(owner, &repo.name, info.branch(), user, stats)
            .await?;

        let mut total_additions = 0;
        let mut production_commits = 0;
        for commit in &commits {
            match self.commit_detail(owner, &repo.name, &commit.sha, stats).await {
                Ok(detail) => {
                    total_additions += detail.stats.additions;
                    if detail.touches_production() {
                        production_commits += 1;
                    }
                }
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::debug!(sha = %commit.sha, error = %short_error_message(&e), "Commit stats unavailable");
                }
            }
        }

        Ok(RepoMetrics {
            stars: info.stargazers_count,
            forks: info.forks_count,
            contributors,
            commits_by_user: commits.len() as u64,
            total_additions,
            production_commits,
        })
    }
}
