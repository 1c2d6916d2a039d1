//! Hand-curated feature catalogs: the JavaScript API paths the JS extractor
//! matches and the CSS value keywords the CSS extractor considers.
//!
//! Both ship as embedded JSON and are parsed once on first use.

use crate::error::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::warn;

const JS_CATALOG_JSON: &str = include_str!("../data/js_catalog.json");
const CSS_KEYWORDS_JSON: &str = include_str!("../data/css_keywords.json");

/// Owners whose prototype methods match on any receiver, in priority order
const RECEIVER_AGNOSTIC_OWNERS: &[&str] = &["Array", "String"];

#[allow(clippy::expect_used)] // Embedded asset, validated by tests
static BUILTIN_CATALOG: LazyLock<ApiCatalog> = LazyLock::new(|| {
    ApiCatalog::from_json(JS_CATALOG_JSON).expect("embedded JS API catalog is valid")
});

#[allow(clippy::expect_used)] // Embedded asset, validated by tests
static BUILTIN_KEYWORDS: LazyLock<KeywordAllowlist> = LazyLock::new(|| {
    KeywordAllowlist::from_json(CSS_KEYWORDS_JSON).expect("embedded CSS keyword list is valid")
});

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    prototype_methods: Vec<String>,
    #[serde(default)]
    static_members: Vec<String>,
    #[serde(default)]
    global_functions: Vec<String>,
    #[serde(default)]
    constructors: Vec<String>,
    #[serde(default)]
    global_values: Vec<String>,
}

/// Lookup tables over the canonical API paths
#[derive(Debug, Default)]
pub struct ApiCatalog {
    /// method name -> `Array.prototype.method` or `String.prototype.method`;
    /// the first owner listed wins
    prototype_methods: FxHashMap<String, String>,
    /// owner global -> member -> `Owner.member`
    static_members: FxHashMap<String, FxHashMap<String, String>>,
    global_functions: FxHashSet<String>,
    /// may be dotted, e.g. `Intl.Segmenter`
    constructors: FxHashSet<String>,
    /// bare names a plain identifier reference can match
    global_names: FxHashSet<String>,
    /// every path, in catalog order, without duplicates
    paths: Vec<String>,
}

impl ApiCatalog {
    pub fn builtin() -> &'static ApiCatalog {
        &BUILTIN_CATALOG
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        let mut catalog = ApiCatalog::default();
        let mut seen = FxHashSet::default();

        for path in &raw.prototype_methods {
            match path.split_once(".prototype.") {
                Some((owner, method)) if RECEIVER_AGNOSTIC_OWNERS.contains(&owner) => {
                    catalog
                        .prototype_methods
                        .entry(method.to_string())
                        .or_insert_with(|| path.clone());
                }
                // Listed for completeness; bare method names like `resize` are too common to match
                Some(_) => {}
                None => warn!("prototype entry without `.prototype.`: {}", path),
            }
        }

        for path in &raw.static_members {
            if let Some((owner, member)) = path.rsplit_once('.') {
                catalog
                    .static_members
                    .entry(owner.to_string())
                    .or_default()
                    .insert(member.to_string(), path.clone());
            }
        }

        catalog.global_functions.extend(raw.global_functions.iter().cloned());
        catalog.constructors.extend(raw.constructors.iter().cloned());
        catalog.global_names.extend(
            raw.constructors
                .iter()
                .filter(|name| !name.contains('.'))
                .chain(raw.global_values.iter())
                .cloned(),
        );

        for path in raw
            .prototype_methods
            .iter()
            .chain(&raw.static_members)
            .chain(&raw.global_functions)
            .chain(&raw.constructors)
            .chain(&raw.global_values)
        {
            if seen.insert(path.as_str()) {
                catalog.paths.push(path.clone());
            }
        }

        Ok(catalog)
    }

    /// `Owner.member` when `owner` is a catalogued global with that static member
    pub fn static_member(&self, owner: &str, member: &str) -> Option<&str> {
        self.static_members.get(owner)?.get(member).map(String::as_str)
    }

    /// `Owner.prototype.method` for a method name, regardless of receiver
    pub fn prototype_method(&self, method: &str) -> Option<&str> {
        self.prototype_methods.get(method).map(String::as_str)
    }

    pub fn global_function(&self, name: &str) -> Option<&str> {
        self.global_functions.get(name).map(String::as_str)
    }

    pub fn constructor(&self, name: &str) -> Option<&str> {
        self.constructors.get(name).map(String::as_str)
    }

    /// Catalogued global value or constructor a bare identifier can refer to
    pub fn global_reference(&self, name: &str) -> Option<&str> {
        self.global_names.get(name).map(String::as_str)
    }

    pub fn api_paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// CSS value keywords worth a value-level check. Generic words such as
/// `auto`, `none` or `block` are deliberately absent.
#[derive(Debug, Default)]
pub struct KeywordAllowlist {
    keywords: FxHashSet<String>,
}

#[derive(Debug, Deserialize)]
struct RawKeywords {
    keywords: Vec<String>,
}

impl KeywordAllowlist {
    pub fn builtin() -> &'static KeywordAllowlist {
        &BUILTIN_KEYWORDS
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawKeywords = serde_json::from_str(json)?;
        Ok(raw.keywords.iter().map(String::as_str).collect())
    }

    /// Case-insensitive membership test
    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.contains(&keyword.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for KeywordAllowlist {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            keywords: iter.into_iter().map(str::to_ascii_lowercase).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_size() {
        let catalog = ApiCatalog::builtin();
        assert!(catalog.len() >= 190, "catalog has {} paths", catalog.len());
    }

    #[test]
    fn test_prototype_methods_prefer_array() {
        let catalog = ApiCatalog::builtin();
        assert_eq!(catalog.prototype_method("at"), Some("Array.prototype.at"));
        assert_eq!(catalog.prototype_method("includes"), Some("Array.prototype.includes"));
        assert_eq!(catalog.prototype_method("replaceAll"), Some("String.prototype.replaceAll"));
        assert_eq!(catalog.prototype_method("push"), None);
    }

    #[test]
    fn test_only_array_and_string_methods_match_any_receiver() {
        let catalog = ApiCatalog::builtin();
        for method in ["resize", "transfer", "toArray", "union", "deref", "finally"] {
            assert_eq!(catalog.prototype_method(method), None, "{method} should not match by name");
        }
        // Still part of the catalog
        assert!(catalog.api_paths().any(|p| p == "ArrayBuffer.prototype.resize"));
    }

    #[test]
    fn test_static_members_need_matching_owner() {
        let catalog = ApiCatalog::builtin();
        assert_eq!(catalog.static_member("Promise", "allSettled"), Some("Promise.allSettled"));
        assert_eq!(catalog.static_member("Object", "hasOwn"), Some("Object.hasOwn"));
        assert_eq!(catalog.static_member("Intl", "Segmenter"), Some("Intl.Segmenter"));
        assert_eq!(catalog.static_member("Array", "hasOwn"), None);
        assert_eq!(catalog.static_member("foo", "allSettled"), None);
    }

    #[test]
    fn test_globals() {
        let catalog = ApiCatalog::builtin();
        assert_eq!(catalog.global_function("structuredClone"), Some("structuredClone"));
        assert_eq!(catalog.constructor("Intl.Segmenter"), Some("Intl.Segmenter"));
        assert_eq!(catalog.global_reference("globalThis"), Some("globalThis"));
        assert_eq!(catalog.global_reference("Map"), Some("Map"));
        assert_eq!(catalog.global_reference("Intl.Segmenter"), None);
        assert_eq!(catalog.global_reference("console"), None);
    }

    #[test]
    fn test_paths_are_unique() {
        let catalog = ApiCatalog::builtin();
        let unique: FxHashSet<&str> = catalog.api_paths().collect();
        assert_eq!(unique.len(), catalog.len());
    }

    #[test]
    fn test_keyword_allowlist() {
        let keywords = KeywordAllowlist::builtin();
        assert!(keywords.contains("grid"));
        assert!(keywords.contains("auto-phrase"));
        assert!(keywords.contains("STICKY"));
        assert!(!keywords.contains("block"));
        assert!(!keywords.contains("auto"));
        assert!(!keywords.contains("red"));
    }
}
