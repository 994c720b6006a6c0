use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{CollectionId, ItemId, ItemStats, ValidationError};

/// Body of `POST /api/vote`. Fields are checked by hand so a missing or
/// malformed id is reported as a 400 with the usual error body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
    pub collection_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub collection_id: Option<String>,
    pub item_id: Option<String>,
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::Missing(field))
}

pub async fn record_vote(
    State(state): State<AppState>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, ApiError> {
    let Json(req) = payload?;
    let collection = CollectionId::parse(required(&req.collection_id, "collectionId")?)?;
    let winner = ItemId::parse(required(&req.winner_id, "winnerId")?)?;
    let loser = ItemId::parse(required(&req.loser_id, "loserId")?)?;

    state.recorder.record_vote(&collection, &winner, &loser).await?;
    Ok(Json(VoteResponse { success: true }))
}

pub async fn item_stats(
    State(state): State<AppState>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> Result<Json<ItemStats>, ApiError> {
    let Query(params) = params?;
    let collection = CollectionId::parse(required(&params.collection_id, "collectionId")?)?;
    let item = ItemId::parse(required(&params.item_id, "itemId")?)?;

    let stats = state.recorder.stats(&collection, &item).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_vote_then_stats() {
        let app = app();
        let (status, body) = post_json(
            &app,
            "/api/vote",
            json!({"winnerId": "t1", "loserId": "t3", "collectionId": "bts"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (status, body) = get_json(&app, "/api/stats?collectionId=bts&itemId=t1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"wins": 1, "battles": 1}));

        let (_, body) = get_json(&app, "/api/stats?collectionId=bts&itemId=t3").await;
        assert_eq!(body, json!({"wins": 0, "battles": 1}));
    }

    #[tokio::test]
    async fn test_unknown_item_stats_are_zero() {
        let (status, body) = get_json(&app(), "/api/stats?collectionId=bts&itemId=never").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"wins": 0, "battles": 0}));
    }

    #[tokio::test]
    async fn test_vote_missing_field_is_400() {
        let (status, body) = post_json(
            &app(),
            "/api/vote",
            json!({"winnerId": "t1", "collectionId": "bts"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_vote_reserved_character_is_400() {
        let (status, _) = post_json(
            &app(),
            "/api/vote",
            json!({"winnerId": "t1", "loserId": "t*", "collectionId": "bts"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_self_vote_is_400() {
        let (status, _) = post_json(
            &app(),
            "/api/vote",
            json!({"winnerId": "t1", "loserId": "t1", "collectionId": "bts"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_outage_is_503() {
        let app = app_with_store(Arc::new(DownStore));
        let (status, body) = post_json(
            &app,
            "/api/vote",
            json!({"winnerId": "t1", "loserId": "t3", "collectionId": "bts"}),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");

        let (status, _) = get_json(&app, "/api/stats?collectionId=bts&itemId=t1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
