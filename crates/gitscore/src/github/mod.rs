//! GitHub REST consumers.
//!
//! # Module Structure
//!
//! - [`types`] - Payload types, validated at the boundary with serde
//! - `client` - [`GitHubClient`] and single-resource endpoints
//! - `link` - `Link` header parsing
//! - `repo` - Commit-search discovery, commit counting, user repositories
//! - `lines` - Line counting over git trees
//! - `report` - Activity report and score inputs
//!
//! # Example
//!
//! ```ignore
//! use gitscore::api::{ClientOptions, RequestStats};
//! use gitscore::github::GitHubClient;
//!
//! let client = GitHubClient::new(&token, ClientOptions::default())?;
//! let mut stats = RequestStats::new();
//! let report = client.activity_report("octocat", 5, &mut stats).await?;
//! println!("Total API requests made: {}", stats.requests);
//! ```

mod client;
mod lines;
mod link;
mod repo;
mod report;
pub mod types;

pub use client::{GITHUB_API_URL, GitHubClient};
pub use lines::{
    CODE_EXTENSIONS, LinesReport, MAX_BLOB_SIZE, MAX_NON_PRINTABLE_RATIO, RepoLines, SkippedRepo,
    is_code_file, line_count, looks_binary,
};
pub use link::{LinkPagination, parse_link_header};
pub use report::{ActivityReport, RepoActivity, RepoFailure, ScoreReport, ScoredRepo};
pub use types::{BranchCommits, RateLimitStatus, Repository, SearchRepository};
