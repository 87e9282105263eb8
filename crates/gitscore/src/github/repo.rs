//! Repository discovery and commit counting.

use std::collections::HashSet;

use crate::api::{
    ApiError, FetchOutcome, MediaType, PageRequest, RequestStats, SearchPage, encode_query_value,
};

use super::client::GitHubClient;
use super::link::parse_link_header;
use super::types::{BranchCommits, CommitSearchItem, CommitSummary, Repository, SearchRepository};

/// Distinct repositories among search hits, in first-seen order.
fn distinct_repositories(items: &[CommitSearchItem]) -> Vec<SearchRepository> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.repository.as_ref())
        .filter(|repo| seen.insert(repo.id))
        .cloned()
        .collect()
}

fn distinct_repository_count(items: &[CommitSearchItem]) -> usize {
    items
        .iter()
        .filter_map(|item| item.repository.as_ref().map(|r| r.id))
        .collect::<HashSet<_>>()
        .len()
}

impl GitHubClient {
    /// Repositories `user` has authored commits in, found through commit search.
    ///
    /// Walks at most [`GitHubClient::max_search_pages`] pages and stops as soon
    /// as `repo_limit` distinct repositories are known.
    pub async fn discover_commit_repos(
        &self,
        user: &str,
        repo_limit: usize,
        stats: &mut RequestStats,
    ) -> Result<Vec<SearchRepository>, ApiError> {
        if repo_limit == 0 {
            return Ok(Vec::new());
        }

        let per_page = self.per_page();
        let query = encode_query_value(&format!("author:{user}"));
        let api = self.api();
        let request = PageRequest::new("commit search", |page| {
            api.url(&format!(
                "/search/commits?q={query}&per_page={per_page}&page={page}"
            ))
        })
        .with_per_page(per_page)
        .with_max_pages(self.max_search_pages())
        .with_accept(MediaType::GitHubCommitSearch);

        let items = self
            .api()
            .paginate::<CommitSearchItem, SearchPage<CommitSearchItem>>(
                &request,
                stats,
                |items| distinct_repository_count(items) < repo_limit,
            )
            .await?;

        let mut repos = distinct_repositories(&items);
        repos.truncate(repo_limit);

        tracing::info!(user, count = repos.len(), "Discovered repositories with commits");
        Ok(repos)
    }

    /// Number of commits by `user` in a repository.
    ///
    /// Asks for one commit per page so the `rel="last"` page number of the
    /// `Link` header is the commit count. Without a header the count is the
    /// length of the single page. An empty repository has no commits.
    pub async fn count_commits_by_author(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        stats: &mut RequestStats,
    ) -> Result<u64, ApiError> {
        let url = self.api().url(&format!(
            "/repos/{owner}/{repo}/commits?author={}&per_page=1",
            encode_query_value(user)
        ));

        let response = match self.api().fetch(&url, MediaType::GitHubV3, stats).await? {
            FetchOutcome::Data(response) => response,
            FetchOutcome::Skip => return Ok(0),
        };

        if let Some(link) = response.header("link")
            && let Some(last) = parse_link_header(link).last_page
        {
            return Ok(u64::from(last));
        }

        let commits: Vec<CommitSummary> = response.json()?;
        Ok(commits.len() as u64)
    }

    /// All public repositories owned by `user`.
    pub async fn user_repos(
        &self,
        user: &str,
        stats: &mut RequestStats,
    ) -> Result<Vec<Repository>, ApiError> {
        let per_page = self.per_page();
        let api = self.api();
        let request = PageRequest::new("user repos", |page| {
            api.url(&format!("/users/{user}/repos?per_page={per_page}&page={page}"))
        })
        .with_per_page(per_page);

        self.api().paginate_all(&request, stats).await
    }

    /// Whether `user` has at least one commit on `branch` of `full_name`.
    pub async fn user_has_commits_on_branch(
        &self,
        full_name: &str,
        branch: &str,
        user: &str,
        stats: &mut RequestStats,
    ) -> Result<BranchCommits, ApiError> {
        let url = self.api().url(&format!(
            "/repos/{full_name}/commits?sha={}&author={}&per_page=1",
            encode_query_value(branch),
            encode_query_value(user)
        ));

        match self
            .api()
            .fetch_json::<Vec<CommitSummary>>(&url, MediaType::GitHubV3, stats)
            .await?
        {
            FetchOutcome::Data(commits) if commits.is_empty() => Ok(BranchCommits::No),
            FetchOutcome::Data(_) => Ok(BranchCommits::Yes),
            FetchOutcome::Skip => Ok(BranchCommits::Skip),
        }
    }
}
