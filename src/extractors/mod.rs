//! Source extractors: turn CSS and JavaScript text into feature usages.
//!
//! Both extractors parse with tree-sitter and walk the tree iteratively.
//! A usage carries the canonical feature key plus its 1-based position.

pub mod catalog;
pub mod css;
pub mod javascript;
pub(crate) mod walker;

pub use catalog::{ApiCatalog, KeywordAllowlist};
pub use css::CssExtractor;
pub use javascript::{JsDialect, JsExtractor};
