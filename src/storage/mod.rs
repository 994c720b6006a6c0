//! Local filesystem layout.
//!
//! Handles the on-disk pieces of the service:
//! - Catalog JSONL files (one item per line, per collection)
//! - Versioned catalog cache entries
//! - The SQLite stats database

use std::path::PathBuf;
use thiserror::Error;

mod jsonl;

pub use jsonl::{JsonlReader, JsonlWriter};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed line {line} in {path:?}: {reason}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.data_dir.join("catalog")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn stats_db_path(&self) -> PathBuf {
        self.data_dir.join("stats.db")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
