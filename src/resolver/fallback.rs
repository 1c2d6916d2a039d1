//! Static fallback table for long-stable features.
//!
//! Consulted when the platform-data provider is absent, fails, or has no
//! record. Covers common CSS properties, the allowlisted CSS values and the
//! JavaScript builtins in the API catalog.

use crate::error::Result;
use crate::types::{AvailabilityStatus, FeatureKey};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

const BUILTIN_FALLBACK_JSON: &str = include_str!("../data/fallback.json");

#[allow(clippy::expect_used)] // Embedded asset, validated by tests
static BUILTIN: LazyLock<Arc<FallbackTable>> = LazyLock::new(|| {
    let table = FallbackTable::from_json(BUILTIN_FALLBACK_JSON)
        .expect("embedded fallback table is valid");
    Arc::new(table)
});

/// Immutable feature key -> status map
#[derive(Debug, Default)]
pub struct FallbackTable {
    entries: FxHashMap<String, Arc<AvailabilityStatus>>,
}

impl FallbackTable {
    /// The table shipped with the crate
    pub fn builtin() -> Arc<FallbackTable> {
        Arc::clone(&BUILTIN)
    }

    /// Parse a `{ "<feature key>": { "baseline": ..., ... } }` document
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, AvailabilityStatus> = serde_json::from_str(json)?;
        Ok(raw.into_iter().collect())
    }

    pub fn get(&self, key: &FeatureKey) -> Option<Arc<AvailabilityStatus>> {
        self.entries.get(key.as_str()).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, AvailabilityStatus)> for FallbackTable {
    fn from_iter<I: IntoIterator<Item = (String, AvailabilityStatus)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
        }
    }
}
