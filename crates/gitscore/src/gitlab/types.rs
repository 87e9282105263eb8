//! GitLab API data types.

use serde::{Deserialize, Serialize};

/// GitLab user, as listed by `/users?username=`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabUser {
    /// User ID.
    pub id: u64,
    /// Username.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

/// Entry of `/users/{id}/events`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitLabEvent {
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub author: Option<EventAuthor>,
}

impl GitLabEvent {
    pub fn author_name(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// GitLab project - fields we need from the API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabProject {
    /// Project ID.
    pub id: u64,
    /// Project name.
    pub name: String,
    /// Full path including namespace (e.g., "group/subgroup/project").
    #[serde(default)]
    pub path_with_namespace: String,
    /// Number of stars.
    #[serde(default)]
    pub star_count: u64,
    /// Number of forks (may not be included in all API responses).
    #[serde(default)]
    pub forks_count: u64,
}

/// Entry of a commit listing; only counted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitLabCommit {
    pub id: String,
}
