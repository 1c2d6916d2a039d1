//! JavaScript/TypeScript usage extraction using tree-sitter.
//!
//! Matches built-in API usages against the curated catalog. Each API path is
//! reported once per file, at its first occurrence in document order.

use std::cell::RefCell;

use rustc_hash::FxHashSet;
use tracing::{trace, warn};
use tree_sitter::{Node, Parser, Tree};

use super::catalog::ApiCatalog;
use super::walker::{first_error_node, node_location, walk_tree};
use crate::error::{CompatError, Result};
use crate::types::UsageRecord;

/// Source grammar to parse with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsDialect {
    /// JavaScript with JSX
    #[default]
    JavaScript,
    TypeScript,
    Tsx,
}

impl JsDialect {
    /// Pick a dialect from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" => Some(JsDialect::JavaScript),
            "ts" | "mts" | "cts" => Some(JsDialect::TypeScript),
            "tsx" => Some(JsDialect::Tsx),
            _ => None,
        }
    }

    fn language_name(self) -> &'static str {
        match self {
            JsDialect::JavaScript => "javascript",
            JsDialect::TypeScript => "typescript",
            JsDialect::Tsx => "tsx",
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            JsDialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            JsDialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            JsDialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Script feature extractor for one dialect
pub struct JsExtractor {
    parser: RefCell<Parser>,
    dialect: JsDialect,
    catalog: &'static ApiCatalog,
}

impl JsExtractor {
    pub fn new(dialect: JsDialect) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&dialect.grammar()).map_err(|e| {
            let language = dialect.language_name();
            CompatError::configuration(format!("Failed to load {language} grammar: {e}"))
        })?;

        Ok(Self {
            parser: RefCell::new(parser),
            dialect,
            catalog: ApiCatalog::builtin(),
        })
    }

    pub fn extract(&self, source: &str) -> Result<Vec<UsageRecord>> {
        let language = self.dialect.language_name();
        let parse_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.parser.borrow_mut().parse(source, None)
        }));

        let tree = match parse_result {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                return Err(CompatError::parse(
                    language,
                    "parser produced no syntax tree",
                    None,
                ))
            }
            Err(_) => {
                warn!("tree-sitter-{} panicked while parsing", language);
                return Err(CompatError::parse(language, "parser crashed", None));
            }
        };

        check_recoverable(&tree, language)?;

        let bytes = source.as_bytes();
        let mut reported: FxHashSet<&'static str> = FxHashSet::default();
        let mut usages = Vec::new();
        let mut cursor = tree.walk();

        let mut report = |path: &'static str, node: &Node<'_>| {
            if reported.insert(path) {
                let location = node_location(node);
                usages.push(UsageRecord::js_api(path, location.line, location.column));
            }
        };

        let stats = walk_tree(&mut cursor, |node, _| match node.kind() {
            "member_expression" => match self.match_member(node, bytes) {
                Some(MemberMatch::Static(path)) => {
                    report(path, &node);
                    // The owner identifier is part of this usage
                    false
                }
                Some(MemberMatch::Prototype(path)) => {
                    report(path, &node);
                    true
                }
                None => true,
            },
            "call_expression" => {
                let callee = node
                    .child_by_field_name("function")
                    .filter(|function| function.kind() == "identifier")
                    .and_then(|function| text(function, bytes));
                if let Some(path) = callee.and_then(|name| self.catalog.global_function(name)) {
                    report(path, &node);
                }
                true
            }
            "new_expression" => {
                let constructor = node
                    .child_by_field_name("constructor")
                    .and_then(|constructor| text(constructor, bytes));
                if let Some(path) = constructor.and_then(|name| self.catalog.constructor(name)) {
                    report(path, &node);
                }
                true
            }
            "identifier" => {
                let name = text(node, bytes);
                if let Some(path) = name.and_then(|name| self.catalog.global_reference(name)) {
                    report(path, &node);
                }
                false
            }
            _ => true,
        });

        if stats.depth_limit_hit {
            warn!("{} walk stopped at depth {}", language, stats.max_depth_reached);
        }
        trace!(
            "{} walk visited {} nodes, {} usages",
            language,
            stats.nodes_visited,
            usages.len()
        );

        Ok(usages)
    }

    fn match_member(&self, node: Node<'_>, bytes: &[u8]) -> Option<MemberMatch> {
        let property = node.child_by_field_name("property")?;
        if property.kind() != "property_identifier" {
            return None;
        }
        let member = text(property, bytes)?;

        let object = node.child_by_field_name("object")?;
        if object.kind() == "identifier" {
            let owner = text(object, bytes);
            if let Some(path) = owner.and_then(|owner| self.catalog.static_member(owner, member)) {
                return Some(MemberMatch::Static(path));
            }
        }

        self.catalog.prototype_method(member).map(MemberMatch::Prototype)
    }
}

enum MemberMatch {
    Static(&'static str),
    Prototype(&'static str),
}

fn text<'a>(node: Node<'_>, bytes: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(bytes).ok()
}

/// tree-sitter recovers from most syntax errors; only give up when nothing at
/// the top level parsed.
fn check_recoverable(tree: &Tree, language: &'static str) -> Result<()> {
    let root = tree.root_node();
    if !root.has_error() {
        return Ok(());
    }

    let mut cursor = root.walk();
    let mut top_level = root.named_children(&mut cursor).peekable();
    let nothing_parsed = root.is_error()
        || (top_level.peek().is_some() && top_level.all(|child| child.is_error()));

    if nothing_parsed {
        let location = first_error_node(tree)
            .map(|node| node_location(&node))
            .unwrap_or_else(|| node_location(&root));
        return Err(CompatError::parse(
            language,
            "no recoverable syntax",
            Some(location),
        ));
    }

    trace!("{} source has recoverable syntax errors", language);
    Ok(())
}

/// Extract usages from JavaScript source
pub fn extract(source: &str) -> Result<Vec<UsageRecord>> {
    extract_with_dialect(source, JsDialect::JavaScript)
}

pub fn extract_with_dialect(source: &str, dialect: JsDialect) -> Result<Vec<UsageRecord>> {
    JsExtractor::new(dialect)?.extract(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apis(usages: &[UsageRecord]) -> Vec<&str> {
        usages.iter().map(|u| u.display_name.as_str()).collect()
    }

    #[test]
    fn test_prototype_method_reported_once() {
        let usages = extract("const a = arr.at(-1);\nconst b = arr.at(-2);").unwrap();
        assert_eq!(apis(&usages), vec!["Array.prototype.at"]);
        assert_eq!(usages[0].feature_key.as_str(), "javascript.builtins.Array.at");
        assert_eq!((usages[0].line, usages[0].column), (1, 11));
    }

    #[test]
    fn test_static_member_wins_over_prototype() {
        let usages = extract("Object.entries(obj);").unwrap();
        assert_eq!(apis(&usages), vec!["Object.entries"]);

        let usages = extract("list.entries();").unwrap();
        assert_eq!(apis(&usages), vec!["Array.prototype.entries"]);
    }

    #[test]
    fn test_library_methods_are_not_builtins() {
        let source = "const out = sharp(img).resize(100);\n\
                      const els = $(sel).toArray();\n\
                      p.finally(done);";
        let usages = extract(source).unwrap();
        assert!(usages.is_empty(), "unexpected usages: {:?}", apis(&usages));
    }

    #[test]
    fn test_static_member_needs_known_owner() {
        let usages = extract("Promise.allSettled(ps); custom.allSettled(ps);").unwrap();
        assert_eq!(apis(&usages), vec!["Promise.allSettled"]);
    }

    #[test]
    fn test_global_function_and_constructor() {
        let source = "const copy = structuredClone(data);\nconst seg = new Intl.Segmenter('en');";
        let usages = extract(source).unwrap();
        let found = apis(&usages);
        assert!(found.contains(&"structuredClone"));
        assert!(found.contains(&"Intl.Segmenter"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_bare_global_reference() {
        let usages = extract("const g = globalThis;").unwrap();
        assert_eq!(apis(&usages), vec!["globalThis"]);
    }

    #[test]
    fn test_member_name_is_not_a_global_reference() {
        let usages = extract("config.globalThis = 1;").unwrap();
        assert!(usages.is_empty());
    }

    #[test]
    fn test_document_order() {
        let usages = extract("x.flat();\ny.replaceAll('a', 'b');\nz.flat();").unwrap();
        assert_eq!(apis(&usages), vec!["Array.prototype.flat", "String.prototype.replaceAll"]);
        assert_eq!(usages[1].line, 2);
    }

    #[test]
    fn test_jsx_parses_in_javascript_dialect() {
        let usages = extract("const el = <div>{items.at(0)}</div>;").unwrap();
        assert_eq!(apis(&usages), vec!["Array.prototype.at"]);
    }

    #[test]
    fn test_typescript_dialects() {
        let ts = "const m: Map<string, number> = new Map();\nconst last = xs.at(-1) as number;";
        let usages = extract_with_dialect(ts, JsDialect::TypeScript).unwrap();
        let found = apis(&usages);
        assert!(found.contains(&"Map"));
        assert!(found.contains(&"Array.prototype.at"));

        let tsx = "const View = (p: { xs: number[] }) => <ul>{p.xs.toSorted()}</ul>;";
        let usages = extract_with_dialect(tsx, JsDialect::Tsx).unwrap();
        assert_eq!(apis(&usages), vec!["Array.prototype.toSorted"]);
    }

    #[test]
    fn test_partial_parse_keeps_results() {
        let usages = extract("const a = arr.at(0);\nconst = ;\n").unwrap();
        assert_eq!(apis(&usages), vec!["Array.prototype.at"]);
    }

    #[test]
    fn test_unparseable_source_fails_with_location() {
        let err = extract(")))").unwrap_err();
        match err {
            CompatError::Parse { language, location, .. } => {
                assert_eq!(language, "javascript");
                assert_eq!(location.map(|l| l.line), Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_source() {
        assert!(extract("").unwrap().is_empty());
    }

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(JsDialect::from_extension("mjs"), Some(JsDialect::JavaScript));
        assert_eq!(JsDialect::from_extension("CTS"), Some(JsDialect::TypeScript));
        assert_eq!(JsDialect::from_extension("tsx"), Some(JsDialect::Tsx));
        assert_eq!(JsDialect::from_extension("css"), None);
    }
}
