//! Explicit cache of fetched boundary collections.
//!
//! Boundary datasets are large and change rarely. Callers hold a
//! [`BoundaryCache`] and pass it to whatever needs boundaries; entries are
//! keyed by [`BoundarySource::cache_key`], so bumping a source's version
//! misses the old entry.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use envrisk_geography_models::BoundarySource;
use geojson::FeatureCollection;

use crate::GeoError;

/// Thread-safe map from cache key to a shared collection.
#[derive(Debug, Default)]
pub struct BoundaryCache {
    entries: RwLock<BTreeMap<String, Arc<FeatureCollection>>>,
}

impl BoundaryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<FeatureCollection>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Stores a collection, replacing any previous entry, and returns the
    /// shared handle.
    pub fn insert(
        &self,
        key: impl Into<String>,
        collection: FeatureCollection,
    ) -> Arc<FeatureCollection> {
        let collection = Arc::new(collection);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), Arc::clone(&collection));
        collection
    }

    /// Returns the cached entry, or runs `load` and caches its result.
    ///
    /// Failures are not cached. Two concurrent misses on the same key may
    /// both load; the later insert wins.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `load`.
    pub async fn get_or_try_insert_with<F, Fut>(
        &self,
        key: &str,
        load: F,
    ) -> Result<Arc<FeatureCollection>, GeoError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FeatureCollection, GeoError>>,
    {
        if let Some(hit) = self.get(key) {
            log::debug!("Boundary cache hit for {key}");
            return Ok(hit);
        }

        log::debug!("Boundary cache miss for {key}");
        let collection = load().await?;
        Ok(self.insert(key, collection))
    }

    /// Drops one entry. Returns `true` if it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Drops every entry belonging to `source`, at any version.
    pub fn invalidate_source(&self, source: &BoundarySource) -> usize {
        let prefix = format!("{}@", source.id);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn empty_collection() -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        }
    }

    fn source(version: &str) -> BoundarySource {
        BoundarySource {
            id: "wa_counties".to_string(),
            name: "WA".to_string(),
            version: version.to_string(),
            geojson_url: String::new(),
            arcgis_url: None,
        }
    }

    #[tokio::test]
    async fn loads_once_then_hits() {
        let cache = BoundaryCache::new();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_try_insert_with("k", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(empty_collection())
                })
                .await
                .unwrap();
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = BoundaryCache::new();
        let result = cache
            .get_or_try_insert_with("k", || async {
                Err(GeoError::conversion("unreachable host"))
            })
            .await;

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidation() {
        let cache = BoundaryCache::new();
        cache.insert(source("1").cache_key(), empty_collection());
        cache.insert(source("2").cache_key(), empty_collection());
        cache.insert("other@1", empty_collection());

        assert!(cache.invalidate("other@1"));
        assert!(!cache.invalidate("other@1"));
        assert!(cache.get("wa_counties@1").is_some());

        assert_eq!(cache.invalidate_source(&source("3")), 2);
        assert!(cache.is_empty());

        cache.insert("x", empty_collection());
        cache.clear();
        assert!(cache.get("x").is_none());
    }
}
