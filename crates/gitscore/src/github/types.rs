//! GitHub API data types.
//!
//! Only the fields the consumers read are modelled. Counts default to zero
//! when GitHub omits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Repository reference embedded in a commit-search item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRepository {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub owner: Owner,
}

/// One commit-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitSearchItem {
    #[serde(default)]
    pub sha: String,
    /// Absent on some hits, which are then ignored.
    pub repository: Option<SearchRepository>,
}

/// A repository as returned by `/repos/{owner}/{repo}` and `/repositories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    /// Missing on empty repositories.
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub fork: bool,
}

impl Repository {
    /// The default branch, falling back to `main`.
    pub fn branch(&self) -> &str {
        self.default_branch.as_deref().unwrap_or("main")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub contributions: u64,
}

/// Entry of a commit listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitFile {
    pub filename: String,
}

/// A single commit with stats and changed files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    #[serde(default)]
    pub stats: CommitStats,
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

impl CommitDetail {
    /// Whether any changed file lives under `src/` or `lib/`.
    pub fn touches_production(&self) -> bool {
        self.files
            .iter()
            .any(|f| f.filename.starts_with("src/") || f.filename.starts_with("lib/"))
    }
}

/// `/repos/{owner}/{repo}/traffic/views` summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TrafficViews {
    pub count: u64,
    #[serde(default)]
    pub uniques: u64,
}

/// Kind of a git tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
    pub sha: String,
    /// Present for blobs only.
    #[serde(default)]
    pub size: Option<u64>,
}

/// `/repos/{owner}/{repo}/git/trees/{sha}?recursive=1`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitTree {
    pub sha: String,
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// `/repos/{owner}/{repo}/git/blobs/{sha}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitBlob {
    pub content: String,
    pub encoding: String,
}

/// A single rate limit resource entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResource {
    /// Maximum requests allowed per period.
    pub limit: u64,
    /// Requests used in current period.
    pub used: u64,
    /// Remaining requests in current period.
    pub remaining: u64,
    /// Unix timestamp when the rate limit resets.
    pub reset: i64,
}

impl RateLimitResource {
    /// Get the reset time as a DateTime.
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
    pub search: RateLimitResource,
}

/// `/rate_limit` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub resources: RateLimitResources,
}

/// Tri-state answer for "did the user commit on this branch".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchCommits {
    Yes,
    No,
    /// Empty repository or unborn branch (409).
    Skip,
}
