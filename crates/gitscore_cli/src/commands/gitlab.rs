use gitscore::api::RequestStats;
use gitscore::gitlab::{GitLabActivityReport, GitLabClient, ProjectActivity};
use gitscore::rates;
use serde::Serialize;
use tabled::Tabled;

use crate::commands::output::{OutputFormat, print_json, print_request_summary, render_table};
use crate::commands::shared::{FetchArgs, require_user};
use crate::config::Config;

/// Handle `gitlab report`.
pub(crate) async fn handle_report(
    user: Option<String>,
    host: Option<String>,
    args: &FetchArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = require_user(user, config.gitlab.user.as_deref(), "gitlab", "GITLAB_USER")?;
    let host = host.unwrap_or_else(|| config.gitlab_host());
    let options = config.client_options(args.pace.then_some(rates::GITLAB_DEFAULT_RPS));
    let client = GitLabClient::new(&host, &config.gitlab_token(), options)?
        .with_per_page(config.fetch.page_size);
    let mut stats = RequestStats::new();

    let report = client
        .activity_report(&user, args.repo_limit(config), &mut stats)
        .await?;

    match args.output {
        OutputFormat::Table => print_report_table(&report, &host),
        OutputFormat::Json => print_json(&report)?,
    }
    print_request_summary(&stats, args.output);
    Ok(())
}

fn print_report_table(report: &GitLabActivityReport, host: &str) {
    if report.user_not_found() {
        println!("User {} not found on {}.", report.username, host);
        return;
    }
    if report.projects.is_empty() {
        println!("No projects with pushes by {} found.", report.username);
    } else {
        println!("Projects with commits by {}:", report.display_author());
        println!("{}", render_table(report.projects.iter().map(ProjectRow::from)));
    }
    for failure in &report.failures {
        println!("Skipped {}: {}", failure.name, failure.error);
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Project")]
    path: String,
    #[tabled(rename = "Commits")]
    commits: u64,
    #[tabled(rename = "Stars")]
    stars: u64,
    #[tabled(rename = "Forks")]
    forks: u64,
}

impl From<&ProjectActivity> for ProjectRow {
    fn from(project: &ProjectActivity) -> Self {
        Self {
            id: project.id,
            path: project.path_with_namespace.clone(),
            commits: project.commits,
            stars: project.stars,
            forks: project.forks,
        }
    }
}
