//! Iterative tree-sitter traversal.
//!
//! Minified bundles nest deeply enough to overflow the stack with a recursive
//! walk, so traversal goes through a `TreeCursor` and is depth-capped.

use tree_sitter::{Node, Tree, TreeCursor};

use crate::error::Location;

/// Maximum depth before a walk stops descending
pub const MAX_AST_DEPTH: usize = 10_000;

/// Result of a traversal
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkStats {
    /// Whether the depth limit cut the walk short
    pub depth_limit_hit: bool,
    pub max_depth_reached: usize,
    pub nodes_visited: usize,
}

/// Visit nodes in document order (pre-order). The visitor receives the node
/// and its depth, and returns `false` to skip that node's children.
pub fn walk_tree<'tree, F>(cursor: &mut TreeCursor<'tree>, mut visitor: F) -> WalkStats
where
    F: FnMut(Node<'tree>, usize) -> bool,
{
    let mut stats = WalkStats::default();
    let mut depth = 0usize;

    loop {
        stats.max_depth_reached = stats.max_depth_reached.max(depth);
        if depth > MAX_AST_DEPTH {
            stats.depth_limit_hit = true;
            return stats;
        }

        let node = cursor.node();
        stats.nodes_visited += 1;
        let should_descend = visitor(node, depth);

        if should_descend && cursor.goto_first_child() {
            depth += 1;
            continue;
        }

        // Climb until a sibling exists, never leaving the starting node
        loop {
            if depth == 0 {
                return stats;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return stats;
            }
            depth -= 1;
        }
    }
}

/// Collect every node of one of `kinds` below (and including) the cursor's node
pub fn collect_by_kind<'a>(cursor: &mut TreeCursor<'a>, kinds: &[&str]) -> Vec<Node<'a>> {
    let mut found = Vec::new();
    walk_tree(cursor, |node, _| {
        if kinds.contains(&node.kind()) {
            found.push(node);
        }
        true
    });
    found
}

/// 1-based position of a node's start
pub fn node_location(node: &Node) -> Location {
    let point = node.start_position();
    Location {
        line: point.row + 1,
        column: point.column + 1,
    }
}

/// First ERROR or MISSING node in document order
pub fn first_error_node(tree: &Tree) -> Option<Node<'_>> {
    if !tree.root_node().has_error() {
        return None;
    }

    let mut found = None;
    let mut cursor = tree.walk();
    walk_tree(&mut cursor, |node, _| {
        if found.is_some() {
            return false;
        }
        if node.is_error() || node.is_missing() {
            found = Some(node);
            return false;
        }
        node.has_error()
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_js(code: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into()).unwrap();
        parser.parse(code, None).unwrap()
    }

    fn parse_css(code: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_css::LANGUAGE.into()).unwrap();
        parser.parse(code, None).unwrap()
    }

    #[test]
    fn test_walk_visits_in_document_order() {
        let tree = parse_js("first(); second();");
        let mut cursor = tree.walk();
        let mut calls = Vec::new();
        let source = "first(); second();";

        walk_tree(&mut cursor, |node, _| {
            if node.kind() == "call_expression" {
                let text = node.utf8_text(source.as_bytes()).unwrap();
                calls.push(text.to_string());
            }
            true
        });

        assert_eq!(calls, vec!["first()", "second()"]);
    }

    #[test]
    fn test_walk_stays_inside_subtree() {
        let source = "function a() { inner(); } outer();";
        let tree = parse_js(source);
        let function = tree.root_node().child(0).unwrap();
        assert_eq!(function.kind(), "function_declaration");

        let mut cursor = function.walk();
        let calls = collect_by_kind(&mut cursor, &["call_expression"]);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].utf8_text(source.as_bytes()).unwrap(), "inner()");
    }

    #[test]
    fn test_skip_children() {
        let tree = parse_js("function foo() { nested(); } function bar() { }");
        let mut cursor = tree.walk();
        let mut functions = 0;
        let mut calls = 0;

        walk_tree(&mut cursor, |node, _| match node.kind() {
            "function_declaration" => {
                functions += 1;
                false
            }
            "call_expression" => {
                calls += 1;
                true
            }
            _ => true,
        });

        assert_eq!(functions, 2);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_depth_tracking() {
        let tree = parse_js("function a() { function b() { function c() { } } }");
        let mut cursor = tree.walk();
        let stats = walk_tree(&mut cursor, |_, _| true);

        assert!(stats.max_depth_reached > 3);
        assert!(!stats.depth_limit_hit);
        assert!(stats.nodes_visited > 5);
    }

    #[test]
    fn test_collect_css_declarations() {
        let tree = parse_css(".a { color: red; } .b { display: grid; margin: 0; }");
        let mut cursor = tree.walk();
        assert_eq!(collect_by_kind(&mut cursor, &["declaration"]).len(), 3);
    }

    #[test]
    fn test_first_error_node() {
        assert!(first_error_node(&parse_css(".a { color: red; }")).is_none());

        let tree = parse_css(".a { color: red;");
        let error = first_error_node(&tree).unwrap();
        assert!(error.is_error() || error.is_missing());
        assert_eq!(node_location(&tree.root_node()), Location { line: 1, column: 1 });
    }
}
