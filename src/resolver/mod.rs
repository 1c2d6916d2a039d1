//! Status resolution: feature key -> availability status.
//!
//! Lookup order is fixed: feature cache, platform-data provider, static
//! fallback table, unknown. A provider record with no baseline verdict
//! counts as a miss. Every outcome (including "unknown") is cached.
//! Provider failures are logged and degrade to the fallback table; the
//! resolver itself never fails for a well-formed key.

mod dataset;
mod fallback;

pub use dataset::DatasetProvider;
pub use fallback::FallbackTable;

use crate::cache::{AvailabilityCache, CacheStats, CachedStatus};
use crate::types::{AvailabilityStatus, FeatureKey, Tier};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Source of live platform-compatibility data.
///
/// Injected into the resolver so tests can substitute a deterministic stub.
pub trait PlatformDataProvider: Send + Sync {
    /// Human-readable provider name for logs
    fn name(&self) -> &str;

    /// Look up `key`. `Ok(None)` means the provider has no record for it.
    fn lookup(&self, key: &FeatureKey) -> anyhow::Result<Option<AvailabilityStatus>>;

    /// Stats of the provider's own data cache, if it keeps one
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }

    fn clear_cache(&self) {}
}

/// Outcome of the two-step CSS property/value check
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Key whose data was used (the value key unless it fell back to the property)
    pub key: FeatureKey,
    pub status: CachedStatus,
}

/// Cache-backed, tiered status lookup
pub struct StatusResolver {
    provider: Option<Arc<dyn PlatformDataProvider>>,
    fallback: Arc<FallbackTable>,
    cache: AvailabilityCache,
}

impl StatusResolver {
    /// Resolver over the built-in fallback table with no live provider
    pub fn new(cache: AvailabilityCache) -> Self {
        Self {
            provider: None,
            fallback: FallbackTable::builtin(),
            cache,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn PlatformDataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<FallbackTable>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Resolve `key` to a status, or `None` when no source knows it
    pub fn resolve_status(&self, key: &FeatureKey) -> CachedStatus {
        if let Some(cached) = self.cache.get(key.as_str()) {
            trace!("feature cache hit for {}", key);
            return cached;
        }

        if let Some(status) = self.query_provider(key) {
            let status = Arc::new(status);
            self.cache.set(key.as_str(), Some(Arc::clone(&status)));
            return Some(status);
        }

        if let Some(status) = self.fallback.get(key) {
            trace!("fallback table hit for {}", key);
            self.cache.set(key.as_str(), Some(Arc::clone(&status)));
            return Some(status);
        }

        debug!("no availability data for {}", key);
        self.cache.set(key.as_str(), None);
        None
    }

    /// Check `property: value`, preferring the value-specific record and
    /// falling back to the bare property when the value has no data.
    pub fn check_css_property_value(&self, property: &str, value: &str) -> Resolution {
        let value_key = FeatureKey::css_value(property, value);
        if let Some(status) = self.resolve_status(&value_key) {
            return Resolution {
                key: value_key,
                status: Some(status),
            };
        }

        let property_key = FeatureKey::css_property(property);
        match self.resolve_status(&property_key) {
            Some(status) => Resolution {
                key: property_key,
                status: Some(status),
            },
            None => Resolution {
                key: value_key,
                status: None,
            },
        }
    }

    fn query_provider(&self, key: &FeatureKey) -> Option<AvailabilityStatus> {
        let provider = self.provider.as_ref()?;

        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| provider.lookup(key)));
        match outcome {
            // A record without a baseline verdict says nothing the fallback table can't
            Ok(Ok(Some(status))) if status.tier == Tier::Unknown => {
                trace!("{} has no baseline verdict for {}", provider.name(), key);
                None
            }
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                warn!("{} lookup failed for {}: {:#}", provider.name(), key, e);
                None
            }
            Err(_) => {
                warn!("{} panicked while resolving {}", provider.name(), key);
                None
            }
        }
    }

    /// Stats of the whole-feature cache
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Stats of the provider's data cache, when there is a provider that keeps one
    pub fn provider_cache_stats(&self) -> Option<CacheStats> {
        self.provider.as_ref().and_then(|p| p.cache_stats())
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// Drop the feature cache and the provider's data cache
    pub fn clear_cache(&self) {
        self.cache.clear();
        if let Some(provider) = &self.provider {
            provider.clear_cache();
        }
    }
}

impl std::fmt::Debug for StatusResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusResolver")
            .field("provider", &self.provider_name())
            .field("fallback_entries", &self.fallback.len())
            .field("cache", &self.cache)
            .finish()
    }
}
