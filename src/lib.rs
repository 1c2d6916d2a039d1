//! baseline-scan - checks CSS and JavaScript sources against web platform
//! Baseline availability.
//!
//! Sources are parsed with tree-sitter, every use of a tracked platform
//! feature is resolved to an availability tier (widely available, newly
//! available, limited), and each usage is classified against the project's
//! required level. A score summarizes a whole scan.
//!
//! # Example
//!
//! ```no_run
//! use baseline_scan::{RequiredLevel, Scanner};
//!
//! let scanner = Scanner::builder().required_level(RequiredLevel::High).build().unwrap();
//! let report = scanner.scan_paths(&["src"]).unwrap();
//!
//! for file in &report.results {
//!     for issue in &file.issues {
//!         println!(
//!             "{}:{}:{} {} {}",
//!             file.file, issue.line, issue.column, issue.severity, issue.message
//!         );
//!     }
//! }
//! ```

pub mod cache;
pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractors;
pub mod output;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod score;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::{AvailabilityCache, CacheStats};
pub use checker::{Checker, SourceKind};
pub use config::ScanConfig;
pub use error::{CompatError, Location, Result};
pub use extractors::JsDialect;
pub use report::generate_issue;
pub use resolver::{
    DatasetProvider, FallbackTable, PlatformDataProvider, Resolution, StatusResolver,
};
pub use scanner::{Scanner, ScannerBuilder};
pub use score::calculate_score;
pub use types::{
    meets_level, AggregateReport, AvailabilityStatus, FeatureKey, FileAnalysis, FileResult,
    FileSummary, Issue, RequiredLevel, Severity, Tier, UsageKind, UsageRecord,
};

/// Check CSS source text with the built-in data
pub fn check_css(source: &str, level: RequiredLevel) -> Result<FileAnalysis> {
    default_checker(level)?.check_css(source)
}

/// Check JavaScript source text with the built-in data
pub fn check_js(source: &str, level: RequiredLevel) -> Result<FileAnalysis> {
    default_checker(level)?.check_js(source, JsDialect::JavaScript)
}

fn default_checker(level: RequiredLevel) -> Result<Checker> {
    let config = ScanConfig {
        required_level: level,
        ..ScanConfig::default()
    };
    Checker::from_config(&config, None)
}
