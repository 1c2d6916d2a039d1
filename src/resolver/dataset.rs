//! Platform-data provider backed by a compat-data snapshot on disk.
//!
//! The snapshot is a nested JSON document following the browser-compat-data
//! layout: each key segment is an object level, and a feature's record lives
//! under `__compat`:
//!
//! ```json
//! { "css": { "properties": { "display": {
//!     "__compat": { "baseline": "high", "baseline_low_date": "2015-07-29" },
//!     "grid": { "__compat": { "baseline": "high" } }
//! } } } }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

use super::PlatformDataProvider;
use crate::cache::{AvailabilityCache, CacheStats, CachedStatus};
use crate::types::{AvailabilityStatus, FeatureKey};

const COMPAT_FIELD: &str = "__compat";

/// Snapshot-backed provider. Raw tree walks are memoized in its data cache.
pub struct DatasetProvider {
    root: Value,
    cache: AvailabilityCache,
}

impl DatasetProvider {
    pub fn new(root: Value, cache: AvailabilityCache) -> Self {
        Self { root, cache }
    }

    pub fn from_json_str(json: &str, cache: AvailabilityCache) -> Result<Self> {
        let root: Value =
            serde_json::from_str(json).context("Failed to parse compat data snapshot")?;
        if !root.is_object() {
            anyhow::bail!("Compat data snapshot must be a JSON object");
        }
        Ok(Self::new(root, cache))
    }

    pub fn from_path(path: &Path, cache: AvailabilityCache) -> Result<Self> {
        debug!("Loading compat data snapshot from {}", path.display());
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read compat data snapshot {}", path.display()))?;
        Self::from_json_str(&json, cache)
            .with_context(|| format!("Invalid compat data snapshot {}", path.display()))
    }

    fn walk(&self, key: &FeatureKey) -> Result<Option<AvailabilityStatus>> {
        let mut node = &self.root;
        for segment in key.segments() {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }

        match node.get(COMPAT_FIELD) {
            Some(compat) => {
                let status = AvailabilityStatus::deserialize(compat)
                    .with_context(|| format!("Malformed {COMPAT_FIELD} record for {key}"))?;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }
}

impl PlatformDataProvider for DatasetProvider {
    fn name(&self) -> &str {
        "compat-data snapshot"
    }

    fn lookup(&self, key: &FeatureKey) -> Result<Option<AvailabilityStatus>> {
        if let Some(cached) = self.cache.get(key.as_str()) {
            trace!("data cache hit for {}", key);
            return Ok(cached.map(|status| (*status).clone()));
        }

        let found = self.walk(key)?;
        let cached: CachedStatus = found.clone().map(Arc::new);
        self.cache.set(key.as_str(), cached);
        Ok(found)
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.cache.stats())
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}
