//! SQLite-backed stats store.
//!
//! One pool per process, created at startup and closed on shutdown. Every
//! call borrows a connection from the pool for the duration of a single
//! statement, so connections go back to the pool on success and error alike.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::{Fields, StatsStore, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SqliteStatsStore {
    pool: SqlitePool,
}

impl SqliteStatsStore {
    /// Connect using a `sqlite://` URL.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?;
        Self::connect_with(options, max_connections).await
    }

    /// Open (creating if needed) a database file.
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        let options = SqliteConnectOptions::new().filename(path);
        Self::connect_with(options, max_connections).await
    }

    async fn connect_with(
        options: SqliteConnectOptions,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Stats store ready (sqlite, {} connections)", max_connections);
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stats_fields (
                key TEXT NOT NULL,
                field TEXT NOT NULL,
                value INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (key, field)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StatsStore for SqliteStatsStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stats_fields (key, field, value) VALUES (?1, ?2, ?3)
            ON CONFLICT (key, field) DO UPDATE SET value = value + excluded.value
            RETURNING value
            "#,
        )
        .bind(key)
        .bind(field)
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }

    async fn get_fields(&self, key: &str) -> Result<Fields, StoreError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT field, value FROM stats_fields WHERE key = ?1")
                .bind(key)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    async fn scan_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Fields)>, StoreError> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT key, field, value FROM stats_fields
            WHERE substr(key, 1, ?1) = ?2
            ORDER BY key, field
            "#,
        )
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        let mut records: Vec<(String, Fields)> = Vec::new();
        for (key, field, value) in rows {
            match records.last_mut() {
                Some((last_key, fields)) if *last_key == key => {
                    fields.insert(field, value);
                }
                _ => {
                    let mut fields = Fields::new();
                    fields.insert(field, value);
                    records.push((key, fields));
                }
            }
        }
        Ok(records)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Stats store closed");
    }
}
