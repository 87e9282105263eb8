use clap::ValueEnum;
use gitscore::RequestStats;
use serde::Serialize;
use tabled::Tabled;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Render rows as a rounded table.
pub(crate) fn render_table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    let mut table = tabled::Table::new(rows);
    table.with(tabled::settings::Style::rounded());
    table.to_string()
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the run's request totals.
///
/// JSON output keeps stdout machine-readable, so the totals go to the log there.
pub(crate) fn print_request_summary(stats: &RequestStats, format: OutputFormat) {
    tracing::info!(
        requests = stats.requests,
        retries = stats.retries,
        skipped = stats.skipped,
        backoff_secs = stats.backoff.as_secs(),
        "Run finished"
    );
    if format == OutputFormat::Table {
        println!("Total API requests made: {}", stats.requests);
    }
}

/// Format a duration in a human-readable way.
pub(crate) fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}
