use gitscore::api::RequestStats;
use gitscore::github::types::{RateLimitResource, RateLimitStatus};
use gitscore::github::{
    ActivityReport, GitHubClient, LinesReport, RepoActivity, RepoFailure, RepoLines, ScoreReport,
    ScoredRepo,
};
use gitscore::{ContributionScore, RepoMetrics, rates};
use serde::Serialize;
use tabled::Tabled;

use crate::commands::output::{
    OutputFormat, format_duration, print_json, print_request_summary, render_table,
};
use crate::commands::shared::{FetchArgs, require_user};
use crate::config::Config;

/// Build a GitHub client from config and flags.
pub(crate) fn github_client(
    config: &Config,
    pace: bool,
) -> Result<GitHubClient, Box<dyn std::error::Error>> {
    let options = config.client_options(pace.then_some(rates::GITHUB_DEFAULT_RPS));
    let client = GitHubClient::with_base_url(
        &config.github_api_url(),
        &config.github_token(),
        options,
    )?
    .with_paging(config.fetch.page_size, config.fetch.max_pages);

    if config.github_token().is_empty() {
        tracing::warn!("No GitHub token configured, requests are unauthenticated");
    }
    Ok(client)
}

/// Handle `github report`.
pub(crate) async fn handle_report(
    user: Option<String>,
    args: &FetchArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = require_user(user, config.github.user.as_deref(), "github", "GITHUB_USER")?;
    let client = github_client(config, args.pace)?;
    let mut stats = RequestStats::new();

    let report = client
        .activity_report(&user, args.repo_limit(config), &mut stats)
        .await?;

    match args.output {
        OutputFormat::Table => print_activity_table(&report),
        OutputFormat::Json => print_json(&report)?,
    }
    print_request_summary(&stats, args.output);
    Ok(())
}

fn print_activity_table(report: &ActivityReport) {
    if report.repos.is_empty() {
        println!("No repositories with commits by {} found.", report.user);
    } else {
        println!("Repositories with commits by {}:", report.user);
        println!("{}", render_table(report.repos.iter().map(ActivityRow::from)));
    }
    print_failures(&report.failures);
}

/// Handle `github score`.
pub(crate) async fn handle_score(
    user: Option<String>,
    args: &FetchArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = require_user(user, config.github.user.as_deref(), "github", "GITHUB_USER")?;
    let client = github_client(config, args.pace)?;
    let mut stats = RequestStats::new();

    let report = client
        .collect_score_metrics(&user, args.repo_limit(config), &mut stats)
        .await?;

    match args.output {
        OutputFormat::Table => {
            if report.repos.is_empty() {
                println!("No repositories with commits by {} found.", report.user);
            } else {
                println!("{}", render_table(report.repos.iter().map(ScoreRow::from)));
            }
            print_failures(&report.failures);
            println!("Total score for {}: {}", report.user, report.total());
        }
        OutputFormat::Json => print_json(&ScoreOutput::from(&report))?,
    }
    print_request_summary(&stats, args.output);
    Ok(())
}

/// Handle `github lines`.
pub(crate) async fn handle_lines(
    user: Option<String>,
    pace: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = require_user(user, config.github.user.as_deref(), "github", "GITHUB_USER")?;
    let client = github_client(config, pace)?;
    let mut stats = RequestStats::new();

    let report = client.lines_report(&user, &mut stats).await?;
    print_lines_table(&report);
    print_request_summary(&stats, OutputFormat::Table);
    Ok(())
}

fn print_lines_table(report: &LinesReport) {
    if !report.repos.is_empty() {
        println!("{}", render_table(report.repos.iter().map(LinesRow::from)));
    }
    for skipped in &report.skipped {
        println!("Skipped {}: {}", skipped.full_name, skipped.reason);
    }
    println!(
        "Total lines of code written by {}: {}",
        report.user,
        report.total()
    );
}

/// Handle `github limits`.
pub(crate) async fn handle_limits(
    output: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = github_client(config, false)?;
    let status = client.rate_limit_status(&mut RequestStats::new()).await?;
    let items = rate_limits_to_display(&status);

    match output {
        OutputFormat::Table => println!("{}", render_table(items)),
        OutputFormat::Json => print_json(&items)?,
    }
    Ok(())
}

fn print_failures(failures: &[RepoFailure]) {
    for failure in failures {
        println!("Skipped {}: {}", failure.name, failure.error);
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct ActivityRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Commits")]
    commits: u64,
    #[tabled(rename = "Stars")]
    stars: u64,
    #[tabled(rename = "Forks")]
    forks: u64,
    #[tabled(rename = "Views")]
    views: String,
}

impl From<&RepoActivity> for ActivityRow {
    fn from(repo: &RepoActivity) -> Self {
        Self {
            id: repo.id,
            name: format!("{}/{}", repo.owner, repo.name),
            commits: repo.commits,
            stars: repo.stars,
            forks: repo.forks,
            views: repo
                .views
                .map_or_else(|| "N/A".to_string(), |v| v.to_string()),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct ScoreRow {
    #[tabled(rename = "Repository")]
    repository: String,
    #[tabled(rename = "Stars")]
    stars: u64,
    #[tabled(rename = "Forks")]
    forks: u64,
    #[tabled(rename = "Contributors")]
    contributors: u64,
    #[tabled(rename = "Commits")]
    commits: u64,
    #[tabled(rename = "Additions")]
    additions: u64,
    #[tabled(rename = "Prod. Commits")]
    production_commits: u64,
    #[tabled(rename = "RIS")]
    ris: String,
    #[tabled(rename = "CQS")]
    cqs: String,
    #[tabled(rename = "PPB")]
    ppb: String,
    #[tabled(rename = "Score")]
    score: u64,
}

impl From<&ScoredRepo> for ScoreRow {
    fn from(repo: &ScoredRepo) -> Self {
        let m = &repo.metrics;
        Self {
            repository: repo.full_name.clone(),
            stars: m.stars,
            forks: m.forks,
            contributors: m.contributors,
            commits: m.commits_by_user,
            additions: m.total_additions,
            production_commits: m.production_commits,
            ris: format!("{:.2}", repo.score.ris),
            cqs: format!("{:.2}", repo.score.cqs),
            ppb: format!("{:.2}", repo.score.ppb),
            score: repo.score.final_score,
        }
    }
}

/// JSON shape of `github score`: the metrics array, then per-repo scores.
#[derive(Debug, Serialize)]
struct ScoreOutput<'a> {
    user: &'a str,
    metrics: Vec<RepoMetrics>,
    scores: Vec<RepoScore<'a>>,
    total: u64,
    failures: &'a [RepoFailure],
}

#[derive(Debug, Serialize)]
struct RepoScore<'a> {
    repository: &'a str,
    #[serde(flatten)]
    score: ContributionScore,
}

impl<'a> From<&'a ScoreReport> for ScoreOutput<'a> {
    fn from(report: &'a ScoreReport) -> Self {
        Self {
            user: &report.user,
            metrics: report.metrics(),
            scores: report
                .repos
                .iter()
                .map(|r| RepoScore {
                    repository: &r.full_name,
                    score: r.score,
                })
                .collect(),
            total: report.total(),
            failures: &report.failures,
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct LinesRow {
    #[tabled(rename = "Repository")]
    repository: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Lines")]
    lines: u64,
}

impl From<&RepoLines> for LinesRow {
    fn from(repo: &RepoLines) -> Self {
        Self {
            repository: repo.full_name.clone(),
            branch: repo.branch.clone(),
            lines: repo.lines,
        }
    }
}

/// Rate limit information for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub(crate) struct RateLimitDisplay {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Used")]
    pub used: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
}

impl RateLimitDisplay {
    pub(crate) fn from_resource(name: &str, resource: &RateLimitResource) -> Self {
        let usage_percent = if resource.limit > 0 {
            (resource.used as f64 / resource.limit as f64) * 100.0
        } else {
            0.0
        };
        let reset_at = resource.reset_at();
        let until_reset = reset_at.signed_duration_since(chrono::Utc::now());
        let reset_in = if until_reset.num_seconds() > 0 {
            format_duration(until_reset)
        } else {
            "now".to_string()
        };

        Self {
            resource: name.to_string(),
            limit: resource.limit.to_string(),
            used: resource.used.to_string(),
            remaining: resource.remaining.to_string(),
            usage_percent: format!("{:.1}%", usage_percent),
            reset_at: reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
        }
    }
}

fn rate_limits_to_display(status: &RateLimitStatus) -> Vec<RateLimitDisplay> {
    vec![
        RateLimitDisplay::from_resource("core", &status.resources.core),
        RateLimitDisplay::from_resource("search", &status.resources.search),
    ]
}
