//! Issues, per-file results and the aggregate report
//!
//! Field names here are read by downstream renderers and PR-comment tooling,
//! so the serialized names must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::feature::FeatureKey;
use super::status::Tier;

/// Issue severity, ordered from least to most severe
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified feature usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    /// Availability tier the usage resolved to
    pub baseline: Tier,
    #[serde(default)]
    pub support: BTreeMap<String, String>,
    #[serde(rename = "featureKey")]
    pub feature_key: FeatureKey,
    pub compatible: bool,
    pub line: usize,
    pub column: usize,
    /// CSS property (CSS issues only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub property: Option<String>,
    /// CSS value keyword (value-level CSS issues only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    /// JavaScript API path (JavaScript issues only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api: Option<String>,
    /// At-rule name without the `@` (at-rule issues only)
    #[serde(rename = "atRule", skip_serializing_if = "Option::is_none", default)]
    pub at_rule: Option<String>,
}

/// Counts shown next to each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl FileSummary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        Self {
            total: issues.len(),
            errors: issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .count(),
            warnings: issues
                .iter()
                .filter(|i| i.severity == Severity::Warning)
                .count(),
        }
    }
}

/// Issues found in one piece of source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FileAnalysis {
    pub issues: Vec<Issue>,
    pub summary: FileSummary,
}

impl FileAnalysis {
    pub fn new(issues: Vec<Issue>) -> Self {
        let summary = FileSummary::from_issues(&issues);
        Self { issues, summary }
    }
}

/// Result for one scanned file. A file that could not be analyzed carries
/// an `error` marker and no issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub file: String,
    pub issues: Vec<Issue>,
    pub summary: FileSummary,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl FileResult {
    pub fn analyzed(file: String, analysis: FileAnalysis) -> Self {
        Self {
            file,
            issues: analysis.issues,
            summary: analysis.summary,
            error: None,
        }
    }

    pub fn failed(file: String, error: String) -> Self {
        Self {
            file,
            issues: Vec::new(),
            summary: FileSummary::default(),
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Highest severity among this file's issues
    pub fn highest_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }
}

/// Output of a whole scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub results: Vec<FileResult>,
    /// 0-100 compatibility score, `null` when no file could be analyzed
    pub score: Option<u8>,
    pub analysis_timestamp: DateTime<Utc>,
}

impl AggregateReport {
    pub fn new(results: Vec<FileResult>) -> Self {
        let analyzed: Vec<&FileResult> = results.iter().filter(|r| !r.is_failed()).collect();
        let score = if analyzed.is_empty() {
            None
        } else {
            let issues: Vec<Issue> = analyzed
                .iter()
                .flat_map(|r| r.issues.iter().cloned())
                .collect();
            Some(crate::score::calculate_score(&issues))
        };

        Self {
            results,
            score,
            analysis_timestamp: Utc::now(),
        }
    }

    pub fn failed_files(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    pub fn total_issues(&self) -> FileSummary {
        self.results.iter().fold(FileSummary::default(), |acc, r| FileSummary {
            total: acc.total + r.summary.total,
            errors: acc.errors + r.summary.errors,
            warnings: acc.warnings + r.summary.warnings,
        })
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.results.iter().filter_map(FileResult::highest_severity).max()
    }
}
