use clap::Args;

use crate::commands::output::OutputFormat;
use crate::config::Config;

/// Flags shared by the report commands.
#[derive(Debug, Clone, Args)]
pub(crate) struct FetchArgs {
    /// Maximum repositories to process (overrides fetch.repo_limit)
    #[arg(long, value_name = "N")]
    pub repo_limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Pace requests at the platform's default rate
    #[arg(long)]
    pub pace: bool,
}

impl FetchArgs {
    pub(crate) fn repo_limit(&self, config: &Config) -> usize {
        self.repo_limit.unwrap_or(config.fetch.repo_limit)
    }
}

/// Pick the user from the flag, then config, or explain how to set one.
pub(crate) fn require_user(
    flag: Option<String>,
    configured: Option<&str>,
    section: &str,
    env_var: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    flag.filter(|u| !u.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .ok_or_else(|| {
            format!(
                "No user given. Pass one as an argument, set {env_var}, or set `user` in the [{section}] config section."
            )
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_user_wins_over_config() {
        let user = require_user(Some("flag".to_string()), Some("config"), "github", "GITHUB_USER")
            .expect("user");
        assert_eq!(user, "flag");
    }

    #[test]
    fn blank_flag_falls_back_to_config() {
        let user = require_user(Some(" ".to_string()), Some("config"), "github", "GITHUB_USER")
            .expect("user");
        assert_eq!(user, "config");
    }

    #[test]
    fn missing_user_names_the_variable() {
        let err = require_user(None, None, "gitlab", "GITLAB_USER").expect_err("no user");
        assert!(err.to_string().contains("GITLAB_USER"));
        assert!(err.to_string().contains("[gitlab]"));
    }

    #[test]
    fn repo_limit_flag_overrides_config() {
        let config = Config::default();
        let args = FetchArgs {
            repo_limit: None,
            output: OutputFormat::Table,
            pace: false,
        };
        assert_eq!(args.repo_limit(&config), 5);
        let args = FetchArgs {
            repo_limit: Some(2),
            ..args
        };
        assert_eq!(args.repo_limit(&config), 2);
    }
}
