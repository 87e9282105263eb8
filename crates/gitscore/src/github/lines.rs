//! Line counting over a repository's git tree.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::api::{ApiError, FetchOutcome, MediaType, RequestStats, short_error_message};

use super::client::GitHubClient;
use super::types::{BranchCommits, CommitSummary, GitBlob, GitTree, TreeEntryKind};

/// Files above this size are not fetched.
pub const MAX_BLOB_SIZE: u64 = 1_000_000;

/// Content with a larger share of non-printable characters is treated as binary.
pub const MAX_NON_PRINTABLE_RATIO: f64 = 0.1;

/// Extensions counted as code or text.
pub const CODE_EXTENSIONS: &[&str] = &[
    ".js", ".ts", ".jsx", ".tsx", ".py", ".java", ".c", ".cpp", ".h", ".hpp", ".cs", ".go", ".rs",
    ".rb", ".php", ".html", ".css", ".json", ".md", ".sh", ".yml", ".yaml", ".xml", ".swift",
    ".kt", ".m", ".pl", ".scala", ".sql", ".txt",
];

pub fn is_code_file(path: &str) -> bool {
    CODE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Tab, line feed, vertical tab, form feed, carriage return, and printable ASCII.
fn is_printable(c: char) -> bool {
    matches!(c, '\x09'..='\x0d' | '\x20'..='\x7e')
}

/// Whether decoded content looks binary.
pub fn looks_binary(content: &str) -> bool {
    let total = content.chars().count();
    if total == 0 {
        return false;
    }
    let non_printable = content.chars().filter(|c| !is_printable(*c)).count();
    non_printable as f64 / total as f64 > MAX_NON_PRINTABLE_RATIO
}

/// Lines as produced by splitting on `\n`. Empty content is one line.
pub fn line_count(content: &str) -> u64 {
    content.split('\n').count() as u64
}

/// Decode a blob. Only base64 blobs carry content.
fn decode_blob(blob: &GitBlob) -> Option<String> {
    if blob.encoding != "base64" {
        return None;
    }
    let compact: String = blob.content.split_whitespace().collect();
    let bytes = STANDARD.decode(compact).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Line count of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoLines {
    pub id: u64,
    pub full_name: String,
    pub branch: String,
    pub lines: u64,
}

/// A repository left out of the line report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRepo {
    pub id: u64,
    pub full_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinesReport {
    pub user: String,
    pub repos: Vec<RepoLines>,
    pub skipped: Vec<SkippedRepo>,
}

impl LinesReport {
    pub fn total(&self) -> u64 {
        self.repos.iter().map(|r| r.lines).sum()
    }

    fn skip(&mut self, id: u64, full_name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::info!(id, repo = full_name, reason = %reason, "Skipping repository");
        self.skipped.push(SkippedRepo {
            id,
            full_name: full_name.to_string(),
            reason,
        });
    }
}

impl GitHubClient {
    /// Sha of the commit `branch` points at.
    async fn latest_commit_sha(
        &self,
        full_name: &str,
        branch: &str,
        stats: &mut RequestStats,
    ) -> Result<FetchOutcome<String>, ApiError> {
        let url = self.api().url(&format!("/repos/{full_name}/commits/{branch}"));
        Ok(self
            .api()
            .fetch_json::<CommitSummary>(&url, MediaType::GitHubV3, stats)
            .await?
            .map(|commit| commit.sha))
    }

    async fn blob_content(
        &self,
        full_name: &str,
        sha: &str,
        stats: &mut RequestStats,
    ) -> Result<Option<String>, ApiError> {
        let url = self.api().url(&format!("/repos/{full_name}/git/blobs/{sha}"));
        let blob: GitBlob = self.api().get_json(&url, MediaType::GitHubV3, stats).await?;
        Ok(decode_blob(&blob))
    }

    /// Count lines of code and text files at the head of `branch`.
    ///
    /// Skips oversized files, files without a known extension, blobs that
    /// fail to fetch, and binary-looking content. An empty repository counts
    /// zero lines.
    pub async fn count_lines_in_repo(
        &self,
        full_name: &str,
        branch: &str,
        stats: &mut RequestStats,
    ) -> Result<u64, ApiError> {
        let sha = match self.latest_commit_sha(full_name, branch, stats).await? {
            FetchOutcome::Data(sha) => sha,
            FetchOutcome::Skip => return Ok(0),
        };

        let url = self
            .api()
            .url(&format!("/repos/{full_name}/git/trees/{sha}?recursive=1"));
        let tree = match self
            .api()
            .fetch_json::<GitTree>(&url, MediaType::GitHubV3, stats)
            .await?
        {
            FetchOutcome::Data(tree) => tree,
            FetchOutcome::Skip => return Ok(0),
        };
        if tree.truncated {
            tracing::warn!(repo = full_name, "Tree listing truncated, count is partial");
        }

        let mut total = 0u64;
        for entry in tree.tree.iter().filter(|e| e.kind == TreeEntryKind::Blob) {
            if entry.size.unwrap_or(0) > MAX_BLOB_SIZE || !is_code_file(&entry.path) {
                continue;
            }

            let content = match self.blob_content(full_name, &entry.sha, stats).await {
                Ok(Some(content)) => content,
                Ok(None) => String::new(),
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        repo = full_name,
                        path = %entry.path,
                        error = %short_error_message(&e),
                        "Skipping unreadable file"
                    );
                    continue;
                }
            };

            if looks_binary(&content) {
                continue;
            }
            total += line_count(&content);
        }

        Ok(total)
    }

    /// Lines in every repository of `user` where `user` committed on the
    /// default branch.
    pub async fn lines_report(
        &self,
        user: &str,
        stats: &mut RequestStats,
    ) -> Result<LinesReport, ApiError> {
        let repos = self.user_repos(user, stats).await?;
        let mut report = LinesReport {
            user: user.to_string(),
            ..Default::default()
        };

        let mut candidates = Vec::new();
        for repo in &repos {
            let Some(branch) = repo.default_branch.as_deref() else {
                report.skip(repo.id, &repo.full_name, "no default branch");
                continue;
            };

            match self
                .user_has_commits_on_branch(&repo.full_name, branch, user, stats)
                .await
            {
                Ok(BranchCommits::Yes) => candidates.push((repo, branch)),
                Ok(BranchCommits::No) => {}
                Ok(BranchCommits::Skip) => {
                    report.skip(repo.id, &repo.full_name, "empty or missing branch");
                }
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => report.skip(repo.id, &repo.full_name, short_error_message(&e)),
            }
        }

        for (repo, branch) in candidates {
            match self.count_lines_in_repo(&repo.full_name, branch, stats).await {
                Ok(lines) => {
                    tracing::info!(id = repo.id, repo = %repo.full_name, branch, lines, "Counted lines");
                    report.repos.push(RepoLines {
                        id: repo.id,
                        full_name: repo.full_name.clone(),
                        branch: branch.to_string(),
                        lines,
                    });
                }
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => report.skip(repo.id, &repo.full_name, short_error_message(&e)),
            }
        }

        Ok(report)
    }
}
