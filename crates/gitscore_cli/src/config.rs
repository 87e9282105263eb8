//! Configuration file support for gitscore.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables prefixed with `GITSCORE_` (e.g., `GITSCORE_GITHUB_TOKEN`)
//! 3. Legacy environment variables (`GITHUB_TOKEN`, `GITHUB_USER`, `GITLAB_TOKEN`,
//!    `GITLAB_USER`, `REPO_LIMIT`)
//! 4. Config file (./gitscore.toml, then ~/.config/gitscore/config.toml)
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use GITSCORE_GITHUB_TOKEN / GITHUB_TOKEN
//! user = "octocat"
//! api_url = "https://api.github.com"  # GitHub Enterprise: https://host/api/v3
//!
//! [gitlab]
//! host = "gitlab.com"  # or self-hosted instance
//! token = "glpat-..."
//! user = "jdoe"
//!
//! [fetch]
//! repo_limit = 5
//! page_size = 100
//! max_pages = 10
//! timeout_ms = 20000
//! max_retries = 5
//! requests_per_second = 0  # 0 disables proactive pacing
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, File, FileFormat};
use config::builder::DefaultState;
use directories::ProjectDirs;
use gitscore::api::ClientOptions;
use serde::Deserialize;

/// Environment variables and the keys they set, lowest priority first.
const ENV_KEYS: &[(&str, &str)] = &[
    ("GITHUB_TOKEN", "github.token"),
    ("GITHUB_USER", "github.user"),
    ("GITLAB_TOKEN", "gitlab.token"),
    ("GITLAB_USER", "gitlab.user"),
    ("REPO_LIMIT", "fetch.repo_limit"),
    ("GITSCORE_GITHUB_TOKEN", "github.token"),
    ("GITSCORE_GITHUB_USER", "github.user"),
    ("GITSCORE_GITHUB_API_URL", "github.api_url"),
    ("GITSCORE_GITLAB_TOKEN", "gitlab.token"),
    ("GITSCORE_GITLAB_USER", "gitlab.user"),
    ("GITSCORE_GITLAB_HOST", "gitlab.host"),
    ("GITSCORE_FETCH_REPO_LIMIT", "fetch.repo_limit"),
    ("GITSCORE_FETCH_PAGE_SIZE", "fetch.page_size"),
    ("GITSCORE_FETCH_MAX_PAGES", "fetch.max_pages"),
    ("GITSCORE_FETCH_TIMEOUT_MS", "fetch.timeout_ms"),
    ("GITSCORE_FETCH_MAX_RETRIES", "fetch.max_retries"),
    ("GITSCORE_FETCH_REQUESTS_PER_SECOND", "fetch.requests_per_second"),
];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// GitLab configuration.
    pub gitlab: GitLabConfig,
    /// Request and paging limits.
    pub fetch: FetchConfig,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    pub token: Option<String>,
    /// Default user for reports.
    pub user: Option<String>,
    /// API base URL, for GitHub Enterprise.
    pub api_url: Option<String>,
}

/// GitLab configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// GitLab host (e.g., "gitlab.com" or "https://gitlab.example.com").
    pub host: Option<String>,
    /// GitLab personal access token.
    pub token: Option<String>,
    /// Default user for reports.
    pub user: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            host: Some("gitlab.com".to_string()),
            token: None,
            user: None,
        }
    }
}

/// Request and paging limits.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum repositories processed per report.
    pub repo_limit: usize,
    /// Items requested per page.
    pub page_size: u32,
    /// Page cap for commit search.
    pub max_pages: u32,
    /// Per-attempt response deadline in milliseconds. 0 disables it.
    pub timeout_ms: u64,
    /// Retries after rate-limit responses.
    pub max_retries: u32,
    /// Proactive pacing. 0 disables it.
    pub requests_per_second: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            repo_limit: 5,
            page_size: 100,
            max_pages: 10,
            timeout_ms: 20_000,
            max_retries: 5,
            requests_per_second: 0,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. XDG config file (~/.config/gitscore/config.toml)
    /// 2. Local config file (./gitscore.toml)
    /// 3. Legacy environment variables, then `GITSCORE_` variables
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("gitscore.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gitscore.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        match Self::from_builder(builder, |name| std::env::var(name).ok()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    }

    /// Apply environment overrides from `lookup` on top of `builder`.
    fn from_builder(
        mut builder: Builder<DefaultState>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        for (name, key) in ENV_KEYS {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                builder = builder.set_override(*key, value)?;
            }
        }
        builder.build()?.try_deserialize()
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gitscore").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Client tunables from the `[fetch]` section.
    ///
    /// `pace_rps` enables pacing when the config leaves it off.
    pub fn client_options(&self, pace_rps: Option<u32>) -> ClientOptions {
        let timeout =
            (self.fetch.timeout_ms > 0).then(|| Duration::from_millis(self.fetch.timeout_ms));
        let rps = match self.fetch.requests_per_second {
            0 => pace_rps,
            configured => Some(configured),
        };

        ClientOptions::default()
            .with_timeout(timeout)
            .with_max_retries(self.fetch.max_retries)
            .with_requests_per_second(rps)
    }

    /// Get the GitHub token. An empty string means unauthenticated.
    #[cfg(feature = "github")]
    pub fn github_token(&self) -> String {
        self.github.token.clone().unwrap_or_default()
    }

    /// Get the GitHub API base URL.
    #[cfg(feature = "github")]
    pub fn github_api_url(&self) -> String {
        self.github
            .api_url
            .clone()
            .unwrap_or_else(|| gitscore::github::GITHUB_API_URL.to_string())
    }

    /// Get the GitLab host.
    #[cfg(feature = "gitlab")]
    pub fn gitlab_host(&self) -> String {
        self.gitlab
            .host
            .clone()
            .unwrap_or_else(|| gitscore::gitlab::GITLAB_HOST.to_string())
    }

    /// Get the GitLab token. An empty string means unauthenticated.
    #[cfg(feature = "gitlab")]
    pub fn gitlab_token(&self) -> String {
        self.gitlab.token.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_toml_and_env(toml: &str, env: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let builder = ConfigBuilder::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Config::from_builder(builder, |name| env.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.repo_limit, 5);
        assert_eq!(config.fetch.page_size, 100);
        assert_eq!(config.fetch.max_pages, 10);
        assert_eq!(config.fetch.timeout_ms, 20_000);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.requests_per_second, 0);
        assert!(config.github.token.is_none());
        assert_eq!(config.gitlab.host, Some("gitlab.com".to_string()));
    }

    #[test]
    fn test_config_builder_with_toml_string() {
        let config = from_toml_and_env(
            r#"
            [github]
            token = "ghp_test123"
            user = "octocat"

            [gitlab]
            host = "https://gitlab.example.com"

            [fetch]
            repo_limit = 12
            timeout_ms = 5000
        "#,
            &[],
        );

        assert_eq!(config.github.token, Some("ghp_test123".to_string()));
        assert_eq!(config.github.user, Some("octocat".to_string()));
        assert_eq!(
            config.gitlab.host,
            Some("https://gitlab.example.com".to_string())
        );
        assert_eq!(config.fetch.repo_limit, 12);
        assert_eq!(config.fetch.timeout_ms, 5000);
        // Untouched values keep their defaults
        assert_eq!(config.fetch.max_retries, 5);
    }

    #[test]
    fn test_legacy_env_overrides_file() {
        let config = from_toml_and_env(
            r#"
            [github]
            token = "from_file"

            [fetch]
            repo_limit = 3
        "#,
            &[("GITHUB_TOKEN", "from_env"), ("REPO_LIMIT", "9")],
        );

        assert_eq!(config.github.token, Some("from_env".to_string()));
        assert_eq!(config.fetch.repo_limit, 9);
    }

    #[test]
    fn test_prefixed_env_overrides_legacy_env() {
        let config = from_toml_and_env(
            "",
            &[
                ("GITLAB_USER", "legacy"),
                ("GITSCORE_GITLAB_USER", "prefixed"),
                ("GITSCORE_FETCH_MAX_RETRIES", "2"),
                ("GITSCORE_GITHUB_API_URL", "https://ghe.example.com/api/v3"),
            ],
        );

        assert_eq!(config.gitlab.user, Some("prefixed".to_string()));
        assert_eq!(config.fetch.max_retries, 2);
        assert_eq!(
            config.github.api_url,
            Some("https://ghe.example.com/api/v3".to_string())
        );
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = from_toml_and_env(
            r#"
            [github]
            user = "octocat"
        "#,
            &[("GITHUB_USER", "  ")],
        );
        assert_eq!(config.github.user, Some("octocat".to_string()));
    }

    #[test]
    fn test_client_options_from_fetch_section() {
        let config = from_toml_and_env(
            r#"
            [fetch]
            timeout_ms = 0
            max_retries = 1
        "#,
            &[],
        );

        let options = config.client_options(None);
        assert_eq!(options.timeout, None);
        assert_eq!(options.max_retries, 1);
        assert_eq!(options.requests_per_second, None);

        let paced = config.client_options(Some(10));
        assert_eq!(paced.requests_per_second, Some(10));
    }

    #[test]
    fn test_configured_pacing_wins_over_flag() {
        let config = from_toml_and_env(
            r#"
            [fetch]
            requests_per_second = 3
        "#,
            &[],
        );
        assert_eq!(config.client_options(Some(10)).requests_per_second, Some(3));
        assert_eq!(
            config.client_options(None).timeout,
            Some(Duration::from_millis(20_000))
        );
    }
}
