//! Issue generation: (usage, resolved status, required level) -> issue.
//!
//! The mapping is total. Every combination of tier and level yields exactly
//! one severity, message and compatibility flag.

use crate::cache::CachedStatus;
use crate::types::{meets_level, Issue, RequiredLevel, Severity, Tier, UsageKind, UsageRecord};

/// Classify one usage
pub fn generate_issue(usage: &UsageRecord, status: &CachedStatus, level: RequiredLevel) -> Issue {
    let tier = status.as_ref().map(|s| s.tier).unwrap_or_default();
    let since = status.as_ref().and_then(|s| s.since());
    let name = &usage.display_name;

    let (severity, message) = match tier {
        Tier::Unknown => (
            Severity::Warning,
            format!("Unknown feature `{name}` may not be widely supported"),
        ),
        Tier::Limited => (
            Severity::Error,
            format!("`{name}` has limited availability and is not Baseline"),
        ),
        Tier::NewlyAvailable if !meets_level(tier, level) => (
            Severity::Warning,
            format!(
                "`{name}` is only newly available{}; required level `{level}` needs widely available features",
                since_suffix(since)
            ),
        ),
        Tier::NewlyAvailable => (
            Severity::Info,
            format!("`{name}` is newly available{}", since_suffix(since)),
        ),
        Tier::WidelyAvailable => (
            Severity::Info,
            format!("`{name}` is widely available{}", since_suffix(since)),
        ),
    };

    let (value, api, at_rule) = match &usage.kind {
        UsageKind::CssProperty { .. } => (None, None, None),
        UsageKind::CssValue { value, .. } => (Some(value.clone()), None, None),
        UsageKind::JsApi { api } => (None, Some(api.clone()), None),
        UsageKind::CssAtRule { name } => (None, None, Some(name.clone())),
    };

    Issue {
        severity,
        message,
        baseline: tier,
        support: status.as_ref().map(|s| s.support.clone()).unwrap_or_default(),
        feature_key: usage.feature_key.clone(),
        compatible: meets_level(tier, level),
        line: usage.line,
        column: usage.column,
        property: usage.property().map(str::to_string),
        value,
        api,
        at_rule,
    }
}

fn since_suffix(since: Option<&str>) -> String {
    since.map(|date| format!(" since {date}")).unwrap_or_default()
}
