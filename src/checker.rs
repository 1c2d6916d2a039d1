//! Per-source analysis: extract usages, resolve each one, classify.
//!
//! Resolving a usage never fails; only a parse failure aborts a source.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::AvailabilityCache;
use crate::config::ScanConfig;
use crate::error::Result;
use crate::extractors::{CssExtractor, JsDialect, JsExtractor};
use crate::report::generate_issue;
use crate::resolver::{PlatformDataProvider, StatusResolver};
use crate::types::{FileAnalysis, Issue, RequiredLevel, UsageKind, UsageRecord};

/// Which extractor a source goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Css,
    Script(JsDialect),
}

impl SourceKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("css") {
            return Some(SourceKind::Css);
        }
        JsDialect::from_extension(ext).map(SourceKind::Script)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }
}

/// Classifies the feature usages of CSS and JavaScript sources
#[derive(Debug, Clone)]
pub struct Checker {
    resolver: Arc<StatusResolver>,
    level: RequiredLevel,
    check_at_rules: bool,
}

impl Checker {
    pub fn new(resolver: Arc<StatusResolver>, level: RequiredLevel) -> Self {
        Self {
            resolver,
            level,
            check_at_rules: false,
        }
    }

    /// Build the resolver stack described by `config`, optionally on top of
    /// a live provider
    pub fn from_config(
        config: &ScanConfig,
        provider: Option<Arc<dyn PlatformDataProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = AvailabilityCache::new(config.feature_cache_capacity)?;
        let mut resolver = StatusResolver::new(cache);
        if let Some(provider) = provider {
            resolver = resolver.with_provider(provider);
        }

        let checker = Self::new(Arc::new(resolver), config.required_level);
        Ok(checker.with_at_rules(config.check_at_rules))
    }

    #[must_use]
    pub fn with_at_rules(mut self, enabled: bool) -> Self {
        self.check_at_rules = enabled;
        self
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    pub fn level(&self) -> RequiredLevel {
        self.level
    }

    pub fn check_css(&self, source: &str) -> Result<FileAnalysis> {
        let usages = CssExtractor::new()?.extract(source)?;
        Ok(FileAnalysis::new(self.classify(&usages)))
    }

    pub fn check_js(&self, source: &str, dialect: JsDialect) -> Result<FileAnalysis> {
        let usages = JsExtractor::new(dialect)?.extract(source)?;
        Ok(FileAnalysis::new(self.classify(&usages)))
    }

    pub fn check_source(&self, source: &str, kind: SourceKind) -> Result<FileAnalysis> {
        match kind {
            SourceKind::Css => self.check_css(source),
            SourceKind::Script(dialect) => self.check_js(source, dialect),
        }
    }

    /// Resolve and classify usages, one issue per checked usage
    pub fn classify(&self, usages: &[UsageRecord]) -> Vec<Issue> {
        let mut issues = Vec::with_capacity(usages.len());

        for usage in usages {
            let issue = match &usage.kind {
                UsageKind::CssAtRule { name } if !self.check_at_rules => {
                    debug!("skipping at-rule @{} (at-rule checks disabled)", name);
                    continue;
                }
                UsageKind::CssValue { property, value } => {
                    let resolution = self.resolver.check_css_property_value(property, value);
                    let mut issue = generate_issue(usage, &resolution.status, self.level);
                    issue.feature_key = resolution.key;
                    issue
                }
                _ => {
                    let status = self.resolver.resolve_status(&usage.feature_key);
                    generate_issue(usage, &status, self.level)
                }
            };

            trace!("{} -> {} ({})", issue.feature_key, issue.severity, issue.baseline);
            issues.push(issue);
        }

        issues
    }
}
