//! Output formatting and reporting.
//!
//! - Human-readable terminal output with colors
//! - JSON output for machine consumption
//! - Markdown for pull-request comments

use crate::cache::CacheStats;
use crate::types::{
    AggregateReport, AvailabilityStatus, FeatureKey, FileResult, Issue, Severity, Tier,
};
use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::fmt::Write;

/// Format the aggregate report as pretty-printed JSON
pub fn format_json(report: &AggregateReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn severity_marker(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "✖ error".bright_red(),
        Severity::Warning => "⚠ warning".bright_yellow(),
        Severity::Info => "ℹ info".bright_cyan(),
    }
}

fn score_colored(score: u8) -> ColoredString {
    let text = format!("{score}/100");
    match score {
        90..=100 => text.bright_green().bold(),
        60..=89 => text.bright_yellow().bold(),
        _ => text.bright_red().bold(),
    }
}

/// Format the report for a terminal. Info-level issues are only listed when
/// `show_info` is set.
pub fn format_terminal(report: &AggregateReport, show_info: bool) -> Result<String> {
    let mut output = String::new();

    for file in &report.results {
        format_terminal_file(&mut output, file, show_info)?;
    }

    if report.results.is_empty() {
        output.push_str("│  No CSS or JavaScript files found\n");
    }

    let totals = report.total_issues();
    output.push_str("│\n");
    let score = report.score.map_or_else(|| "n/a".bright_black(), score_colored);
    writeln!(
        output,
        "└─ Score: {}  ({} files, {} errors, {} warnings, {} failed)",
        score,
        report.results.len(),
        totals.errors,
        totals.warnings,
        report.failed_files()
    )?;
    Ok(output)
}

fn format_terminal_file(output: &mut String, file: &FileResult, show_info: bool) -> Result<()> {
    if let Some(error) = &file.error {
        writeln!(output, "├─ {} {}", file.file.bright_white(), "failed".bright_red())?;
        writeln!(output, "│       {}", error.bright_black())?;
        return Ok(());
    }

    let visible: Vec<&Issue> = file
        .issues
        .iter()
        .filter(|i| show_info || i.severity > Severity::Info)
        .collect();
    let summary = if file.summary.errors + file.summary.warnings == 0 {
        "ok".bright_green()
    } else {
        format!("{} errors, {} warnings", file.summary.errors, file.summary.warnings).normal()
    };

    writeln!(output, "├─ {} {}", file.file.bright_white(), summary)?;
    for issue in visible {
        writeln!(
            output,
            "│       {} {}:{} {}",
            severity_marker(issue.severity),
            issue.line,
            issue.column,
            issue.message
        )?;
        writeln!(output, "│           {}", issue.feature_key.as_str().bright_black())?;
    }
    Ok(())
}

/// Escape a value for a markdown table cell
fn md_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Format the report as a markdown pull-request comment
pub fn format_markdown(report: &AggregateReport) -> Result<String> {
    let mut output = String::new();
    let totals = report.total_issues();

    output.push_str("## Baseline compatibility report\n\n");
    let score = report.score.map_or_else(|| "n/a".to_string(), |s| format!("{s}/100"));
    writeln!(
        output,
        "**Score:** {} · {} files · {} errors · {} warnings\n",
        score,
        report.results.len(),
        totals.errors,
        totals.warnings
    )?;

    let rows: Vec<(&FileResult, &Issue)> = report
        .results
        .iter()
        .flat_map(|file| file.issues.iter().map(move |issue| (file, issue)))
        .filter(|(_, issue)| issue.severity > Severity::Info)
        .collect();
    let failed: Vec<&FileResult> = report.results.iter().filter(|f| f.is_failed()).collect();

    if rows.is_empty() && failed.is_empty() {
        output.push_str("No compatibility issues found.\n");
        return Ok(output);
    }

    output.push_str("| File | Line | Severity | Feature | Message |\n");
    output.push_str("|---|---|---|---|---|\n");
    for (file, issue) in rows {
        writeln!(
            output,
            "| `{}` | {}:{} | {} | `{}` | {} |",
            md_cell(&file.file),
            issue.line,
            issue.column,
            issue.severity,
            md_cell(issue.feature_key.as_str()),
            md_cell(&issue.message)
        )?;
    }
    for file in failed {
        writeln!(
            output,
            "| `{}` | - | failed | - | {} |",
            md_cell(&file.file),
            md_cell(file.error.as_deref().unwrap_or_default())
        )?;
    }
    Ok(output)
}

/// Format a single resolved feature for `feature`
pub fn format_feature_terminal(key: &FeatureKey, status: Option<&AvailabilityStatus>) -> String {
    let Some(status) = status else {
        return format!("{}  {}\n", key.as_str().bright_white(), "unknown".bright_black());
    };

    let tier = match status.tier {
        Tier::WidelyAvailable => "widely available".bright_green(),
        Tier::NewlyAvailable => "newly available".bright_cyan(),
        Tier::Limited => "limited availability".bright_red(),
        Tier::Unknown => "unknown".bright_black(),
    };

    let mut output = format!("{}  {}", key.as_str().bright_white(), tier);
    if let Some(since) = status.since() {
        output.push_str(&format!(" since {since}"));
    }
    output.push('\n');
    for (browser, version) in &status.support {
        output.push_str(&format!("   {browser} {version}\n"));
    }
    output
}

pub fn format_feature_json(
    key: &FeatureKey,
    status: Option<&AvailabilityStatus>,
) -> Result<String> {
    let value = serde_json::json!({ "featureKey": key, "status": status });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Cache diagnostics printed with `--stats`
pub fn format_cache_stats(name: &str, stats: &CacheStats) -> String {
    format!(
        "{}: {} hits, {} misses, {:.1}% hit rate, {}/{} entries",
        name,
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0,
        stats.size,
        stats.max_size
    )
}
