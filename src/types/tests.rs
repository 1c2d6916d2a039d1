//! Tests for the issue and report types
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use std::collections::BTreeMap;

fn issue(severity: Severity, baseline: Tier) -> Issue {
    Issue {
        severity,
        message: String::new(),
        baseline,
        support: BTreeMap::new(),
        feature_key: FeatureKey::css_property("display"),
        compatible: severity == Severity::Info,
        line: 1,
        column: 1,
        property: Some("display".to_string()),
        value: None,
        api: None,
        at_rule: None,
    }
}

#[test]
fn test_severity_ordering() {
    assert!(Severity::Info < Severity::Warning);
    assert!(Severity::Warning < Severity::Error);
}

#[test]
fn test_issue_wire_field_names() {
    let mut i = issue(Severity::Error, Tier::Limited);
    i.support.insert("chrome".to_string(), "119".to_string());
    let json = serde_json::to_value(&i).unwrap();

    assert_eq!(json["severity"], "error");
    assert_eq!(json["baseline"], false);
    assert_eq!(json["featureKey"], "css.properties.display");
    assert_eq!(json["compatible"], false);
    assert_eq!(json["property"], "display");
    assert_eq!(json["support"]["chrome"], "119");
    assert_eq!(json["line"], 1);
    assert_eq!(json["column"], 1);
    assert!(json.get("api").is_none());
    assert!(json.get("value").is_none());
}

#[test]
fn test_file_summary_counts() {
    let issues = vec![
        issue(Severity::Error, Tier::Limited),
        issue(Severity::Warning, Tier::Unknown),
        issue(Severity::Warning, Tier::NewlyAvailable),
        issue(Severity::Info, Tier::WidelyAvailable),
    ];
    let summary = FileSummary::from_issues(&issues);
    let expected = FileSummary {
        total: 4,
        errors: 1,
        warnings: 2,
    };
    assert_eq!(summary, expected);
}

#[test]
fn test_failed_file_is_distinguishable() {
    let failed = FileResult::failed("bad.css".to_string(), "css parse error".to_string());
    let empty = FileResult::analyzed("empty.css".to_string(), FileAnalysis::default());

    assert!(failed.is_failed());
    assert!(!empty.is_failed());
    assert_eq!(failed.issues.len(), empty.issues.len());

    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["error"], "css parse error");
    let json = serde_json::to_value(&empty).unwrap();
    assert!(json.get("error").is_none());
}

#[test]
fn test_aggregate_score_is_null_without_analyzed_files() {
    let failed = FileResult::failed("a.js".to_string(), "boom".to_string());
    let report = AggregateReport::new(vec![failed]);
    assert_eq!(report.score, None);
    assert_eq!(report.failed_files(), 1);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["score"].is_null());
}

#[test]
fn test_aggregate_score_ignores_failed_files() {
    let ok = FileResult::analyzed(
        "a.css".to_string(),
        FileAnalysis::new(vec![issue(Severity::Error, Tier::Limited)]),
    );
    let bad = FileResult::failed("b.css".to_string(), "boom".to_string());
    let report = AggregateReport::new(vec![ok, bad]);

    assert_eq!(report.score, Some(30));
    assert_eq!(report.total_issues().errors, 1);
    assert_eq!(report.highest_severity(), Some(Severity::Error));
}

#[test]
fn test_aggregate_score_of_clean_files_is_perfect() {
    let clean = FileResult::analyzed("a.css".to_string(), FileAnalysis::default());
    let report = AggregateReport::new(vec![clean]);
    assert_eq!(report.score, Some(100));
}
