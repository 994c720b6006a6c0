//! Catalog loading.
//!
//! The catalog itself comes from an external collaborator (a music API, a
//! file drop). This module wraps it with deduplication and a versioned cache
//! so the tournament and the leaderboard see one canonical item per song.

pub mod cache;
pub mod dedup;
pub mod source;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{CollectionId, Item};

pub use cache::{CachedCatalog, CatalogCache};
pub use dedup::{deduplicate, normalize_name, DedupRules, DEDUP_SCHEMA_VERSION};
pub use source::{HttpCatalogSource, JsonlCatalogSource};

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(CollectionId),

    #[error("Catalog source unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog source returned malformed data: {0}")]
    Malformed(String),
}

impl CatalogError {
    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_) | CatalogError::Malformed(_))
    }
}

/// Source of raw catalog items for a collection.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Source identifier for logging.
    fn name(&self) -> &'static str;

    /// Fetch every raw item of the collection, before deduplication.
    async fn fetch_catalog(&self, collection: &CollectionId) -> Result<Vec<Item>, CatalogError>;
}

/// Cache → source → deduplicate → cache.
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    rules: DedupRules,
    cache: Option<CatalogCache>,
}

impl CatalogService {
    pub fn new(source: Arc<dyn CatalogSource>, rules: DedupRules) -> Self {
        Self {
            source,
            rules,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: CatalogCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load the deduplicated catalog for a collection.
    ///
    /// Cache failures are logged and bypassed; source failures are returned.
    pub async fn load(&self, collection: &CollectionId) -> Result<Vec<Item>, CatalogError> {
        if let Some(cache) = &self.cache {
            match cache.get(collection).await {
                Ok(Some(items)) => {
                    info!("Catalog cache hit for {}", collection);
                    return Ok(items);
                }
                Ok(None) => {}
                Err(e) => warn!("Catalog cache read failed for {}: {}", collection, e),
            }
        }

        let raw = self.source.fetch_catalog(collection).await?;
        let items = deduplicate(&raw, &self.rules);
        info!(
            source = self.source.name(),
            raw = raw.len(),
            canonical = items.len(),
            "Loaded catalog for {}",
            collection
        );

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(collection, &items).await {
                warn!("Catalog cache write failed for {}: {}", collection, e);
            }
        }

        Ok(items)
    }
}

/// In-memory source used by tests and the CLI's one-shot commands.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalogSource {
    collections: std::collections::HashMap<CollectionId, Vec<Item>>,
}

impl StaticCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: CollectionId, items: Vec<Item>) -> Self {
        self.collections.insert(collection, items);
        self
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_catalog(&self, collection: &CollectionId) -> Result<Vec<Item>, CatalogError> {
        self.collections
            .get(collection)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownCollection(collection.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: StaticCatalogSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_catalog(
            &self,
            collection: &CollectionId,
        ) -> Result<Vec<Item>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_catalog(collection).await
        }
    }

    fn raw_items() -> Vec<Item> {
        vec![
            Item::new(ItemId::parse("1").unwrap(), "Song (Live)", "Hits"),
            Item::new(ItemId::parse("2").unwrap(), "Song", "Hits"),
            Item::new(ItemId::parse("3").unwrap(), "Other", "Hits"),
        ]
    }

    #[tokio::test]
    async fn test_load_deduplicates() {
        let bts = CollectionId::parse("bts").unwrap();
        let source = StaticCatalogSource::new().with_collection(bts.clone(), raw_items());
        let service = CatalogService::new(Arc::new(source), DedupRules::default());

        let items = service.load(&bts).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_load_unknown_collection() {
        let service =
            CatalogService::new(Arc::new(StaticCatalogSource::new()), DedupRules::default());
        let err = service
            .load(&CollectionId::parse("nobody").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCollection(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_load_uses_cache_on_second_call() {
        let tmp = tempfile::tempdir().unwrap();
        let bts = CollectionId::parse("bts").unwrap();
        let source = Arc::new(CountingSource {
            inner: StaticCatalogSource::new().with_collection(bts.clone(), raw_items()),
            calls: AtomicUsize::new(0),
        });
        let cache = CatalogCache::new(tmp.path().to_path_buf(), std::time::Duration::from_secs(60));
        let service =
            CatalogService::new(source.clone(), DedupRules::default()).with_cache(cache);

        let first = service.load(&bts).await.unwrap();
        let second = service.load(&bts).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
