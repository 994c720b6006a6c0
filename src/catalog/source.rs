//! Concrete catalog sources.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{CatalogError, CatalogSource};
use crate::models::{CollectionId, Item};
use crate::storage::{JsonlReader, StorageError};

/// Reads `{dir}/{collection}.jsonl`, one item per line.
#[derive(Debug, Clone)]
pub struct JsonlCatalogSource {
    dir: PathBuf,
}

impl JsonlCatalogSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl CatalogSource for JsonlCatalogSource {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn fetch_catalog(&self, collection: &CollectionId) -> Result<Vec<Item>, CatalogError> {
        let reader =
            JsonlReader::<Item>::new(self.dir.join(format!("{}.jsonl", collection.as_str())));
        if !reader.exists() {
            return Err(CatalogError::UnknownCollection(collection.clone()));
        }

        let read = tokio::task::spawn_blocking(move || reader.read_all())
            .await
            .map_err(|e| CatalogError::Unavailable(format!("catalog reader panicked: {}", e)))?;

        read.map_err(|e| match e {
            StorageError::Io(io) => CatalogError::Unavailable(io.to_string()),
            other => CatalogError::Malformed(other.to_string()),
        })
    }
}

/// Body returned by a remote catalog endpoint.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    items: Vec<Item>,
}

/// Fetches `GET {base_url}/{collection}` from a remote catalog service.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    base_url: Url,
}

impl HttpCatalogSource {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn url_for(&self, collection: &CollectionId) -> Result<Url, CatalogError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(collection.as_str())
            .map_err(|e| CatalogError::Unavailable(format!("invalid catalog URL: {}", e)))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_catalog(&self, collection: &CollectionId) -> Result<Vec<Item>, CatalogError> {
        let url = self.url_for(collection)?;
        debug!("Fetching catalog from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(CatalogError::UnknownCollection(collection.clone())),
            status if !status.is_success() => {
                return Err(CatalogError::Unavailable(format!(
                    "catalog service returned HTTP {}",
                    status.as_u16()
                )))
            }
            _ => {}
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        let parsed: CatalogResponse =
            serde_json::from_slice(&body).map_err(|e| CatalogError::Malformed(e.to_string()))?;

        Ok(parsed.items)
    }
}
