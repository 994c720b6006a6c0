//! Persistent win/battle counters.
//!
//! The store is a small hash-of-counters abstraction:
//! - records live under `stats:{collection}:{item}`
//! - each record holds the integer fields `wins` and `battles`
//! - the only mutation is an atomic per-field increment
//!
//! Everything above the store (vote recording, leaderboard ranking) talks to
//! the [`StatsStore`] trait, so backends can be swapped freely.

pub mod leaderboard;
pub mod memory;
pub mod recorder;
pub mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CollectionId, ItemId, ValidationError};

pub use leaderboard::LeaderboardRanker;
pub use memory::MemoryStatsStore;
pub use recorder::VoteRecorder;
pub use sqlite::SqliteStatsStore;

pub const FIELD_WINS: &str = "wins";
pub const FIELD_BATTLES: &str = "battles";

const KEY_NAMESPACE: &str = "stats";

/// Errors raised by a stats store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Stats store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt stats record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors from the vote and leaderboard operations built on the store.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Integer fields of one record.
pub type Fields = HashMap<String, i64>;

/// Key-value store of integer counters.
///
/// Implementations must make `increment` atomic per field: concurrent
/// increments of the same field never lose an update.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Backend identifier for logging.
    fn name(&self) -> &'static str;

    /// Add `delta` to `field` of `key`, creating either lazily. Returns the
    /// new value.
    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    /// All fields of `key`; empty when the record does not exist.
    async fn get_fields(&self, key: &str) -> Result<Fields, StoreError>;

    /// Every record whose key starts with `prefix`, ordered by key.
    async fn scan_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Fields)>, StoreError>;

    /// Release backend resources. Further calls may fail.
    async fn close(&self) {}
}

/// `stats:{collection}:{item}`
pub fn stats_key(collection: &CollectionId, item: &ItemId) -> String {
    format!("{}:{}:{}", KEY_NAMESPACE, collection.as_str(), item.as_str())
}

/// `stats:{collection}:`, the scan prefix for one collection.
pub fn collection_prefix(collection: &CollectionId) -> String {
    format!("{}:{}:", KEY_NAMESPACE, collection.as_str())
}

/// Recover the item id from a key produced by [`stats_key`].
pub fn item_id_from_key(collection: &CollectionId, key: &str) -> Option<ItemId> {
    key.strip_prefix(&collection_prefix(collection))
        .and_then(|rest| ItemId::parse(rest).ok())
}

/// Read a counter field, treating a missing field as zero.
pub(crate) fn counter(fields: &Fields, key: &str, field: &str) -> Result<u64, StoreError> {
    match fields.get(field) {
        None => Ok(0),
        Some(v) => u64::try_from(*v).map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("negative {} counter {}", field, v),
        }),
    }
}
