//! Versioned on-disk cache of deduplicated catalogs.
//!
//! Entries record the deduplicator's schema version; an entry written under
//! different grouping rules is treated as a miss.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::dedup::DEDUP_SCHEMA_VERSION;
use crate::models::{CollectionId, Item};
use crate::storage::StorageError;

/// A cached catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCatalog {
    pub schema_version: u32,
    pub collection_id: CollectionId,
    pub cached_at: DateTime<Utc>,
    pub items: Vec<Item>,
}

impl CachedCatalog {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        // a TTL too large for chrono never expires
        chrono::Duration::from_std(ttl)
            .map(|ttl| now.signed_duration_since(self.cached_at) < ttl)
            .unwrap_or(true)
    }
}

/// File-per-collection cache under a directory.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    dir: PathBuf,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        Self { dir, ttl }
    }

    fn path_for(&self, collection: &CollectionId) -> PathBuf {
        self.dir.join(format!("{}.json", collection.as_str()))
    }

    /// Cached items, or `None` when absent, stale or from another schema.
    pub async fn get(&self, collection: &CollectionId) -> Result<Option<Vec<Item>>, StorageError> {
        let path = self.path_for(collection);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).await?;
        let cached: CachedCatalog = serde_json::from_slice(&bytes)?;

        if cached.schema_version != DEDUP_SCHEMA_VERSION {
            debug!(
                "Discarding cached catalog for {} (schema {} != {})",
                collection, cached.schema_version, DEDUP_SCHEMA_VERSION
            );
            return Ok(None);
        }
        if !cached.is_fresh(self.ttl, Utc::now()) {
            debug!("Cached catalog for {} expired", collection);
            return Ok(None);
        }

        Ok(Some(cached.items))
    }

    pub async fn put(&self, collection: &CollectionId, items: &[Item]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).await?;

        let entry = CachedCatalog {
            schema_version: DEDUP_SCHEMA_VERSION,
            collection_id: collection.clone(),
            cached_at: Utc::now(),
            items: items.to_vec(),
        };
        let json = serde_json::to_vec(&entry)?;
        fs::write(self.path_for(collection), json).await?;

        debug!("Cached {} items for {}", items.len(), collection);
        Ok(())
    }
}
