//! GitLab REST consumers.
//!
//! Authenticates with the `PRIVATE-TOKEN` header and negotiates plain
//! `application/json`. Commit counts are filtered by the author name GitLab
//! reports on the user's push events, since the commits API filters by name
//! rather than username.

mod client;
mod report;
pub mod types;

pub use client::{GITLAB_HOST, GitLabClient, PushedProjects, api_base_url};
pub use report::{GitLabActivityReport, ProjectActivity, ProjectFailure};
pub use types::{GitLabEvent, GitLabProject, GitLabUser};
