//! CSS usage extraction using tree-sitter-css.
//!
//! Emits one usage per allowlisted value keyword in a declaration, one per
//! declared property (unless that line already reported the property), and
//! one per at-rule.

use std::cell::RefCell;

use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};
use tree_sitter::{Node, Parser};

use super::catalog::KeywordAllowlist;
use super::walker::{collect_by_kind, node_location, walk_tree};
use crate::error::{CompatError, Result};
use crate::types::UsageRecord;

const LANGUAGE: &str = "css";

/// Statement kinds that open with an `@keyword` token
const AT_RULE_KINDS: &[&str] = &[
    "at_rule",
    "media_statement",
    "import_statement",
    "charset_statement",
    "namespace_statement",
    "keyframes_statement",
    "supports_statement",
    "scope_statement",
];

/// Stylesheet feature extractor
pub struct CssExtractor {
    parser: RefCell<Parser>,
    keywords: &'static KeywordAllowlist,
}

impl CssExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_css::LANGUAGE.into())
            .map_err(|e| CompatError::configuration(format!("Failed to load CSS grammar: {e}")))?;

        Ok(Self {
            parser: RefCell::new(parser),
            keywords: KeywordAllowlist::builtin(),
        })
    }

    /// Use a custom keyword allowlist instead of the built-in one
    #[must_use]
    pub fn with_keywords(mut self, keywords: &'static KeywordAllowlist) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn extract(&self, source: &str) -> Result<Vec<UsageRecord>> {
        let parse_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.parser.borrow_mut().parse(source, None)
        }));

        let tree = match parse_result {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                return Err(CompatError::parse(
                    LANGUAGE,
                    "parser produced no syntax tree",
                    None,
                ))
            }
            Err(_) => {
                warn!("tree-sitter-css panicked while parsing stylesheet");
                return Err(CompatError::parse(LANGUAGE, "parser crashed", None));
            }
        };

        let root = tree.root_node();
        if root.has_error() {
            return Err(CompatError::parse(
                LANGUAGE,
                "stylesheet contains syntax errors",
                None,
            ));
        }

        let bytes = source.as_bytes();
        let mut usages = Vec::new();
        let mut seen: FxHashSet<(usize, String)> = FxHashSet::default();
        let mut cursor = tree.walk();

        let stats = walk_tree(&mut cursor, |node, _| match node.kind() {
            "declaration" => {
                self.collect_declaration(node, bytes, &mut seen, &mut usages);
                false
            }
            kind if AT_RULE_KINDS.contains(&kind) => {
                if let Some(name) = at_rule_name(node, bytes) {
                    let location = node_location(&node);
                    let usage = UsageRecord::css_at_rule(&name, location.line, location.column);
                    usages.push(usage);
                }
                true
            }
            _ => true,
        });

        if stats.depth_limit_hit {
            warn!("CSS walk stopped at depth {}", stats.max_depth_reached);
        }
        trace!("CSS walk visited {} nodes, {} usages", stats.nodes_visited, usages.len());

        Ok(usages)
    }

    fn collect_declaration(
        &self,
        declaration: Node<'_>,
        bytes: &[u8],
        seen: &mut FxHashSet<(usize, String)>,
        usages: &mut Vec<UsageRecord>,
    ) {
        let mut children = declaration.walk();
        let Some(property_node) = declaration
            .named_children(&mut children)
            .find(|n| n.kind() == "property_name")
        else {
            return;
        };

        let Ok(property_text) = property_node.utf8_text(bytes) else {
            return;
        };
        if property_text.starts_with("--") {
            trace!("skipping custom property {}", property_text);
            return;
        }
        let property = property_text.to_ascii_lowercase();
        // Dedup is keyed by the declaration's own line, even when its value wraps
        let property_location = node_location(&property_node);

        let mut values_cursor = declaration.walk();
        let mut emitted_values: Vec<String> = Vec::new();
        for value_node in collect_by_kind(&mut values_cursor, &["plain_value"]) {
            let Ok(text) = value_node.utf8_text(bytes) else {
                continue;
            };
            if !self.keywords.contains(text) {
                continue;
            }
            let value = text.to_ascii_lowercase();
            if emitted_values.contains(&value) {
                continue;
            }

            let location = node_location(&value_node);
            let usage = UsageRecord::css_value(&property, &value, location.line, location.column);
            usages.push(usage);
            seen.insert((property_location.line, property.clone()));
            emitted_values.push(value);
        }

        if seen.insert((property_location.line, property.clone())) {
            let usage = UsageRecord::css_property(
                &property,
                property_location.line,
                property_location.column,
            );
            usages.push(usage);
        }
    }
}

/// Lowercased at-rule name without the `@`, read from the statement's first token
fn at_rule_name(node: Node<'_>, bytes: &[u8]) -> Option<String> {
    let keyword = node.child(0)?;
    let text = keyword.utf8_text(bytes).ok()?;
    match text.strip_prefix('@') {
        Some(name) if !name.is_empty() => Some(name.to_ascii_lowercase()),
        _ => {
            debug!("{} without an @keyword: {:?}", node.kind(), text);
            None
        }
    }
}

/// Extract usages with a fresh extractor
pub fn extract(source: &str) -> Result<Vec<UsageRecord>> {
    CssExtractor::new()?.extract(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UsageKind;

    fn keys(usages: &[UsageRecord]) -> Vec<&str> {
        usages.iter().map(|u| u.feature_key.as_str()).collect()
    }

    #[test]
    fn test_allowlisted_value_replaces_property_usage() {
        let usages = extract(".c { word-break: auto-phrase; }").unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.word-break.auto-phrase"]);
        assert!(matches!(usages[0].kind, UsageKind::CssValue { .. }));
        assert_eq!(usages[0].display_name, "word-break: auto-phrase");
    }

    #[test]
    fn test_display_grid_is_one_usage() {
        let usages = extract(".g { display: grid; }").unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.display.grid"]);
    }

    #[test]
    fn test_plain_properties() {
        let usages = extract(".a { color: red; padding: 0; }").unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.color", "css.properties.padding"]);
    }

    #[test]
    fn test_custom_properties_skipped() {
        let usages = extract(":root { --layout: grid; }").unwrap();
        assert!(usages.is_empty());
    }

    #[test]
    fn test_values_inside_functions() {
        let css = ".x { grid-template-columns: repeat(auto-fill, minmax(100px, 1fr)); }";
        let usages = extract(css).unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.grid-template-columns.auto-fill"]);
    }

    #[test]
    fn test_values_deduplicated_within_declaration() {
        let css = ".x { grid-template-columns: repeat(auto-fit, 1fr) repeat(auto-fit, 2fr); }";
        let usages = extract(css).unwrap();
        assert_eq!(usages.len(), 1);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let usages = extract(".x { DISPLAY: Grid; }").unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.display.grid"]);
    }

    #[test]
    fn test_same_line_property_reported_once() {
        let usages = extract(".a { color: red; } .b { color: blue; }").unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.color"]);

        let usages = extract(".a { color: red; }\n.b { color: blue; }").unwrap();
        assert_eq!(usages.len(), 2);
    }

    #[test]
    fn test_positions_are_one_based() {
        let usages = extract(".a {\n  display: flex;\n  margin: 0;\n}").unwrap();
        assert_eq!(usages.len(), 2);
        assert_eq!((usages[0].line, usages[0].column), (2, 12));
        assert_eq!((usages[1].line, usages[1].column), (3, 3));
    }

    #[test]
    fn test_at_rules() {
        let css = "@media (min-width: 600px) { .a { color: red; } }\n@layer base;\n";
        let usages = extract(css).unwrap();
        let at_rules: Vec<&str> = usages
            .iter()
            .filter(|u| u.is_at_rule())
            .map(|u| u.feature_key.as_str())
            .collect();
        assert_eq!(at_rules, vec!["css.at-rules.media", "css.at-rules.layer"]);
        assert!(keys(&usages).contains(&"css.properties.color"));
    }

    #[test]
    fn test_syntax_error_has_no_location() {
        let err = extract(".a { color: red;").unwrap_err();
        match err {
            CompatError::Parse { language, location, .. } => {
                assert_eq!(language, "css");
                assert!(location.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrapped_value_suppresses_property() {
        let css = ".a {\n  grid-template-columns:\n    repeat(auto-fill, 1fr);\n}";
        let usages = extract(css).unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.grid-template-columns.auto-fill"]);
        assert_eq!((usages[0].line, usages[0].column), (3, 12));
    }

    #[test]
    fn test_length_units_are_not_keywords() {
        let usages = extract(".a { height: 100dvh; }").unwrap();
        assert_eq!(keys(&usages), vec!["css.properties.height"]);
    }

    #[test]
    fn test_empty_stylesheet() {
        assert!(extract("").unwrap().is_empty());
    }
}
