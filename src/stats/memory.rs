//! In-process stats store.
//!
//! Counters live in an ordered map behind an async lock; a single write-lock
//! section per increment makes each one atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Fields, StatsStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    records: RwLock<BTreeMap<String, Fields>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut records = self.records.write().await;
        let value = records
            .entry(key.to_string())
            .or_default()
            .entry(field.to_string())
            .or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn get_fields(&self, key: &str) -> Result<Fields, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned().unwrap_or_default())
    }

    async fn scan_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Fields)>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_increment_creates_lazily() {
        let store = MemoryStatsStore::new();
        assert!(store.get_fields("stats:c:a").await.unwrap().is_empty());

        assert_eq!(store.increment("stats:c:a", "wins", 1).await.unwrap(), 1);
        assert_eq!(store.increment("stats:c:a", "wins", 1).await.unwrap(), 2);

        let fields = store.get_fields("stats:c:a").await.unwrap();
        assert_eq!(fields.get("wins"), Some(&2));
        assert_eq!(fields.get("battles"), None);
    }

    #[tokio::test]
    async fn test_scan_by_prefix_is_bounded_and_ordered() {
        let store = MemoryStatsStore::new();
        store.increment("stats:c:b", "battles", 1).await.unwrap();
        store.increment("stats:c:a", "battles", 1).await.unwrap();
        store.increment("stats:cc:a", "battles", 1).await.unwrap();
        store.increment("stats:d:a", "battles", 1).await.unwrap();

        let keys: Vec<String> = store
            .scan_by_prefix("stats:c:")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["stats:c:a", "stats:c:b"]);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStatsStore::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment("stats:c:x", "battles", 1).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let fields = store.get_fields("stats:c:x").await.unwrap();
        assert_eq!(fields.get("battles"), Some(&50));
    }
}
