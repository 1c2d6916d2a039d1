//! Feature keys and the usage records extractors produce

use serde::{Deserialize, Serialize};

pub const CSS_PROPERTY_PREFIX: &str = "css.properties.";
pub const CSS_AT_RULE_PREFIX: &str = "css.at-rules.";
pub const JS_BUILTIN_PREFIX: &str = "javascript.builtins.";

/// Canonical identifier of a checkable feature, e.g. `css.properties.display.grid`
/// or `javascript.builtins.Array.at`. Compared by exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureKey(String);

impl FeatureKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// `css.properties.<property>`
    pub fn css_property(property: &str) -> Self {
        Self(format!("{CSS_PROPERTY_PREFIX}{property}"))
    }

    /// `css.properties.<property>.<value>`
    pub fn css_value(property: &str, value: &str) -> Self {
        Self(format!("{CSS_PROPERTY_PREFIX}{property}.{value}"))
    }

    /// `css.at-rules.<name>`
    pub fn css_at_rule(name: &str) -> Self {
        Self(format!("{CSS_AT_RULE_PREFIX}{name}"))
    }

    /// Translate a catalog API path into a key:
    /// `Array.prototype.at` -> `javascript.builtins.Array.at`,
    /// `Promise.allSettled` -> `javascript.builtins.Promise.allSettled`,
    /// `structuredClone` -> `javascript.builtins.structuredClone`.
    pub fn js_api(api_path: &str) -> Self {
        let path = api_path.replacen(".prototype.", ".", 1);
        Self(format!("{JS_BUILTIN_PREFIX}{path}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key segments, split on `.`
    pub fn segments(&self) -> std::str::Split<'_, char> {
        self.0.split('.')
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FeatureKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What kind of source construct produced a usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageKind {
    /// A declaration's property, e.g. `display`
    CssProperty { property: String },
    /// An allowlisted keyword in a declaration's value, e.g. `display: grid`
    CssValue {
        property: String,
        value: String,
    },
    /// An at-rule such as `@container`
    CssAtRule { name: String },
    /// A built-in JavaScript API path, e.g. `Array.prototype.at`
    JsApi { api: String },
}

/// One occurrence of a feature in source text. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub feature_key: FeatureKey,
    pub line: usize,
    pub column: usize,
    pub display_name: String,
    #[serde(flatten)]
    pub kind: UsageKind,
}

impl UsageRecord {
    pub fn css_property(property: &str, line: usize, column: usize) -> Self {
        Self {
            feature_key: FeatureKey::css_property(property),
            line,
            column,
            display_name: property.to_string(),
            kind: UsageKind::CssProperty {
                property: property.to_string(),
            },
        }
    }

    pub fn css_value(property: &str, value: &str, line: usize, column: usize) -> Self {
        Self {
            feature_key: FeatureKey::css_value(property, value),
            line,
            column,
            display_name: format!("{property}: {value}"),
            kind: UsageKind::CssValue {
                property: property.to_string(),
                value: value.to_string(),
            },
        }
    }

    pub fn css_at_rule(name: &str, line: usize, column: usize) -> Self {
        Self {
            feature_key: FeatureKey::css_at_rule(name),
            line,
            column,
            display_name: format!("@{name}"),
            kind: UsageKind::CssAtRule {
                name: name.to_string(),
            },
        }
    }

    pub fn js_api(api_path: &str, line: usize, column: usize) -> Self {
        Self {
            feature_key: FeatureKey::js_api(api_path),
            line,
            column,
            display_name: api_path.to_string(),
            kind: UsageKind::JsApi {
                api: api_path.to_string(),
            },
        }
    }

    /// CSS property this usage belongs to, if any
    pub fn property(&self) -> Option<&str> {
        match &self.kind {
            UsageKind::CssProperty { property } | UsageKind::CssValue { property, .. } => {
                Some(property)
            }
            _ => None,
        }
    }

    pub fn is_at_rule(&self) -> bool {
        matches!(self.kind, UsageKind::CssAtRule { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_key_translation() {
        assert_eq!(
            FeatureKey::js_api("Array.prototype.at").as_str(),
            "javascript.builtins.Array.at"
        );
        assert_eq!(
            FeatureKey::js_api("Promise.allSettled").as_str(),
            "javascript.builtins.Promise.allSettled"
        );
        assert_eq!(
            FeatureKey::js_api("structuredClone").as_str(),
            "javascript.builtins.structuredClone"
        );
        assert_eq!(
            FeatureKey::js_api("Intl.Segmenter.prototype.segment").as_str(),
            "javascript.builtins.Intl.Segmenter.segment"
        );
    }

    #[test]
    fn test_css_keys() {
        assert_eq!(
            FeatureKey::css_property("display").as_str(),
            "css.properties.display"
        );
        assert_eq!(
            FeatureKey::css_value("word-break", "auto-phrase").as_str(),
            "css.properties.word-break.auto-phrase"
        );
        assert_eq!(
            FeatureKey::css_at_rule("container").as_str(),
            "css.at-rules.container"
        );
    }

    #[test]
    fn test_usage_property() {
        let usage = UsageRecord::css_value("display", "grid", 1, 5);
        assert_eq!(usage.property(), Some("display"));
        assert_eq!(usage.display_name, "display: grid");
        assert!(UsageRecord::js_api("fetch", 1, 1).property().is_none());
        assert!(UsageRecord::css_at_rule("layer", 2, 1).is_at_rule());
    }
}
