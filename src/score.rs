//! Compatibility score over a set of issues.

use crate::types::Issue;

/// Weighted mean of issue tiers scaled to 0-100. No issues scores 100.
pub fn calculate_score(issues: &[Issue]) -> u8 {
    if issues.is_empty() {
        return 100;
    }

    let total: f64 = issues.iter().map(|issue| issue.baseline.weight()).sum();
    let mean = total / issues.len() as f64;
    (mean * 100.0).round().clamp(0.0, 100.0) as u8
}
