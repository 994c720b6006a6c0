use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{CollectionId, Item};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub collection_id: CollectionId,
    pub items: Vec<Item>,
    pub total: usize,
}

/// The deduplicated catalog of a collection.
pub async fn get_catalog(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let collection_id = CollectionId::parse(&collection_id)?;
    let items = state.catalog.load(&collection_id).await?;

    Ok(Json(CatalogResponse {
        collection_id,
        total: items.len(),
        items,
    }))
}
