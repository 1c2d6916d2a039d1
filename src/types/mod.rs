//! Type definitions shared by the extractors, resolver and reports

mod feature;
mod issue;
mod status;

#[cfg(test)]
mod tests;

pub use feature::{
    FeatureKey, UsageKind, UsageRecord, CSS_AT_RULE_PREFIX, CSS_PROPERTY_PREFIX, JS_BUILTIN_PREFIX,
};
pub use issue::{AggregateReport, FileAnalysis, FileResult, FileSummary, Issue, Severity};
pub use status::{meets_level, AvailabilityStatus, RequiredLevel, Tier};
