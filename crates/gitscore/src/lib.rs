//! gitscore - developer activity across GitHub and GitLab.
//!
//! This library gathers a developer's repositories, commits, stars, and forks
//! through the forges' REST APIs and computes a heuristic contribution score.
//! All traffic goes through [`api::ApiClient`], which retries rate-limited
//! calls with the waits the server asks for and never more than
//! [`api::DEFAULT_MAX_RETRIES`] times.
//!
//! # Features
//!
//! - `github` - GitHub consumers (commit search, reports, line counting)
//! - `gitlab` - GitLab consumers (push-event discovery, reports)
//!
//! # Example
//!
//! ```ignore
//! use gitscore::api::{ClientOptions, RequestStats};
//! use gitscore::github::GitHubClient;
//!
//! let client = GitHubClient::new(&token, ClientOptions::default())?;
//! let mut stats = RequestStats::new();
//! let report = client.collect_score_metrics("octocat", 5, &mut stats).await?;
//! println!("{} points", report.total());
//! ```

pub mod api;
pub mod http;
pub mod pacing;
pub mod score;

#[cfg(feature = "github")]
pub mod github;

#[cfg(feature = "gitlab")]
pub mod gitlab;

pub use api::{ApiClient, ApiError, Auth, ClientOptions, FetchOutcome, MediaType, RequestStats};
pub use pacing::{ApiRateLimiter, rates};
pub use score::{ContributionScore, RepoMetrics};
