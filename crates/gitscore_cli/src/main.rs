//! gitscore CLI - developer activity reports and contribution scores.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[cfg(any(feature = "github", feature = "gitlab"))]
use crate::commands::shared::FetchArgs;
#[cfg(feature = "github")]
use crate::commands::output::OutputFormat;

#[derive(Parser)]
#[command(name = "gitscore")]
#[command(version)]
#[command(about = "Developer activity and contribution scores from GitHub and GitLab")]
#[command(
    long_about = "gitscore finds the repositories a developer has committed to on GitHub or \
GitLab and reports their commits, stars, forks, and views. It can also compute a \
heuristic contribution score per repository and count lines of code. Rate-limited \
requests are retried with the waits the server asks for."
)]
#[command(after_long_help = r#"EXAMPLES
    Activity report for a GitHub user:
        $ gitscore github report octocat

    Contribution scores as JSON, for the first 10 repositories:
        $ gitscore github score octocat --repo-limit 10 -o json

    Lines of code on default branches:
        $ gitscore github lines octocat

    Activity on a self-hosted GitLab:
        $ gitscore gitlab report jdoe --host gitlab.example.com

    Generate shell completions:
        $ gitscore completions bash > ~/.local/share/bash-completion/completions/gitscore

CONFIGURATION
    gitscore reads configuration from:
      1. ~/.config/gitscore/config.toml (or $XDG_CONFIG_HOME/gitscore/config.toml)
      2. ./gitscore.toml
      3. Environment variables (GITSCORE_* prefix, e.g., GITSCORE_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GITSCORE_GITHUB_TOKEN     GitHub personal access token (also GITHUB_TOKEN)
    GITSCORE_GITHUB_USER      Default GitHub user (also GITHUB_USER)
    GITSCORE_GITHUB_API_URL   GitHub API base URL (default: https://api.github.com)
    GITSCORE_GITLAB_TOKEN     GitLab personal access token (also GITLAB_TOKEN)
    GITSCORE_GITLAB_USER      Default GitLab user (also GITLAB_USER)
    GITSCORE_GITLAB_HOST      GitLab host (default: gitlab.com)
    GITSCORE_FETCH_REPO_LIMIT Maximum repositories per report (also REPO_LIMIT)
    RUST_LOG                  Log filter (default: gitscore=info,gitscore_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GitHub reports
    #[cfg(feature = "github")]
    Github {
        #[command(subcommand)]
        action: GithubAction,
    },
    /// GitLab reports
    #[cfg(feature = "gitlab")]
    Gitlab {
        #[command(subcommand)]
        action: GitlabAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(feature = "github")]
#[derive(Subcommand)]
enum GithubAction {
    /// Commits, stars, forks, and views per repository the user committed to
    Report {
        /// GitHub username (default from config or GITHUB_USER)
        user: Option<String>,

        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Contribution score per repository
    Score {
        /// GitHub username (default from config or GITHUB_USER)
        user: Option<String>,

        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Lines of code in repositories where the user committed on the default branch
    Lines {
        /// GitHub username (default from config or GITHUB_USER)
        user: Option<String>,

        /// Pace requests at the platform's default rate
        #[arg(long)]
        pace: bool,
    },
    /// Show current rate limit status
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[cfg(feature = "gitlab")]
#[derive(Subcommand)]
enum GitlabAction {
    /// Commits, stars, and forks per project the user pushed to
    Report {
        /// GitLab username (default from config or GITLAB_USER)
        user: Option<String>,

        /// GitLab host (default from config or gitlab.com)
        #[arg(short = 'H', long)]
        host: Option<String>,

        #[command(flatten)]
        fetch: FetchArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("gitscore=info,gitscore_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => commands::meta::handle_completions(shell),
        Commands::Man { output } => commands::meta::handle_man(output),
        #[cfg(feature = "github")]
        Commands::Github { action } => {
            let config = config::Config::load();
            match action {
                GithubAction::Report { user, fetch } => {
                    commands::github::handle_report(user, &fetch, &config).await
                }
                GithubAction::Score { user, fetch } => {
                    commands::github::handle_score(user, &fetch, &config).await
                }
                GithubAction::Lines { user, pace } => {
                    commands::github::handle_lines(user, pace, &config).await
                }
                GithubAction::Limits { output } => {
                    commands::github::handle_limits(output, &config).await
                }
            }
        }
        #[cfg(feature = "gitlab")]
        Commands::Gitlab { action } => {
            let config = config::Config::load();
            match action {
                GitlabAction::Report { user, host, fetch } => {
                    commands::gitlab::handle_report(user, host, &fetch, &config).await
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[cfg(feature = "github")]
    #[test]
    fn github_score_parses_limit_and_json_output() {
        let cli = Cli::try_parse_from([
            "gitscore",
            "github",
            "score",
            "octocat",
            "--repo-limit",
            "3",
            "-o",
            "json",
        ])
        .expect("valid arguments");

        match cli.command {
            Commands::Github {
                action: GithubAction::Score { user, fetch },
            } => {
                assert_eq!(user.as_deref(), Some("octocat"));
                assert_eq!(fetch.repo_limit, Some(3));
                assert_eq!(fetch.output, OutputFormat::Json);
                assert!(!fetch.pace);
            }
            _ => panic!("expected github score"),
        }
    }

    #[cfg(feature = "github")]
    #[test]
    fn github_report_user_is_optional() {
        let cli = Cli::try_parse_from(["gitscore", "github", "report"]).expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::Github {
                action: GithubAction::Report { user: None, .. }
            }
        ));
    }

    #[cfg(feature = "gitlab")]
    #[test]
    fn gitlab_report_accepts_short_host_flag() {
        let cli = Cli::try_parse_from(["gitscore", "gitlab", "report", "jdoe", "-H", "gitlab.example.com"])
            .expect("valid arguments");

        match cli.command {
            Commands::Gitlab {
                action: GitlabAction::Report { user, host, .. },
            } => {
                assert_eq!(user.as_deref(), Some("jdoe"));
                assert_eq!(host.as_deref(), Some("gitlab.example.com"));
            }
            #[allow(unreachable_patterns)]
            _ => panic!("expected gitlab report"),
        }
    }

    #[test]
    fn unknown_output_format_is_rejected() {
        let result = Cli::try_parse_from(["gitscore", "github", "report", "-o", "yaml"]);
        assert!(result.is_err());
    }
}
