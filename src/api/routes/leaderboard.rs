use std::collections::HashMap;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{CollectionId, Item, ItemId, Leaderboard, SortBy};

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
    #[serde(alias = "sortBy")]
    pub sort: Option<String>,
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    params: Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<Json<Leaderboard>, ApiError> {
    let Query(params) = params?;
    let collection_id = CollectionId::parse(&collection_id)?;

    let sort_by = match params.sort.as_deref() {
        None | Some("") => SortBy::default(),
        Some(raw) => raw.parse::<SortBy>()?,
    };
    let limit = params
        .limit
        .unwrap_or(state.leaderboard.default_limit)
        .min(state.leaderboard.max_limit);

    let mut leaderboard = state.ranker.compute(&collection_id, sort_by, limit).await?;

    // Metadata is best-effort; a catalog outage leaves the ranking intact.
    match state.catalog.load(&collection_id).await {
        Ok(items) => enrich(&mut leaderboard, items),
        Err(e) => warn!(
            "Leaderboard for {} served without catalog metadata: {}",
            collection_id, e
        ),
    }

    Ok(Json(leaderboard))
}

fn enrich(leaderboard: &mut Leaderboard, items: Vec<Item>) {
    let mut by_id: HashMap<ItemId, Item> =
        items.into_iter().map(|item| (item.id.clone(), item)).collect();
    for entry in &mut leaderboard.entries {
        entry.item = by_id.remove(&entry.item_id);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::config::LeaderboardConfig;
    use crate::stats::MemoryStatsStore;
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::json;
    use std::sync::Arc;

    async fn vote(app: &Router, collection: &str, winner: &str, loser: &str) {
        let (status, _) = post_json(
            app,
            "/api/vote",
            json!({"winnerId": winner, "loserId": loser, "collectionId": collection}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_leaderboard_by_wins_with_metadata() {
        let app = app();
        vote(&app, "bts", "t1", "t3").await;
        vote(&app, "bts", "t1", "t4").await;
        vote(&app, "bts", "t3", "t4").await;

        let (status, body) = get_json(&app, "/api/leaderboard/bts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collectionId"], "bts");
        assert_eq!(body["sortedBy"], "wins");
        assert_eq!(body["total"], 3);
        assert_eq!(body["entries"][0]["itemId"], "t1");
        assert_eq!(body["entries"][0]["wins"], 2);
        assert_eq!(body["entries"][0]["winRate"], 100.0);
        assert_eq!(body["entries"][0]["item"]["name"], "Butter");
        assert_eq!(body["totals"]["totalBattles"], 6);
        assert_eq!(body["totals"]["totalWins"], 3);
        assert_eq!(body["totals"]["itemsWithStats"], 3);
    }

    #[tokio::test]
    async fn test_leaderboard_limit_and_sort() {
        let app = app();
        vote(&app, "bts", "t1", "t3").await;
        vote(&app, "bts", "t4", "t3").await;
        vote(&app, "bts", "t4", "t1").await;

        let (status, body) = get_json(&app, "/api/leaderboard/bts?limit=1&sort=winrate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sortedBy"], "winrate");
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["entries"][0]["itemId"], "t4");
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn test_unknown_sort_key_is_422() {
        let (status, body) = get_json(&app(), "/api/leaderboard/bts?sort=elo").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "CONTRACT_VIOLATION");
    }

    #[tokio::test]
    async fn test_limit_is_clamped_to_max() {
        let limits = LeaderboardConfig {
            default_limit: 2,
            max_limit: 2,
        };
        let app = app_with(Arc::new(MemoryStatsStore::new()), catalog(), limits);
        vote(&app, "bts", "t1", "t3").await;
        vote(&app, "bts", "t4", "t5").await;

        let (status, body) = get_json(&app, "/api/leaderboard/bts?limit=1000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"].as_array().unwrap().len(), 2);
        assert_eq!(body["total"], 4);
    }

    #[tokio::test]
    async fn test_zero_limit_is_400() {
        let (status, _) = get_json(&app(), "/api/leaderboard/bts?limit=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_limit_is_400() {
        let (status, body) = get_json(&app(), "/api/leaderboard/bts?limit=ten").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_collection_without_catalog_still_ranks() {
        let app = app();
        vote(&app, "indie", "x", "y").await;

        let (status, body) = get_json(&app, "/api/leaderboard/indie").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"][0]["itemId"], "x");
        assert!(body["entries"][0].get("item").is_none());
    }

    #[tokio::test]
    async fn test_store_outage_is_503_not_empty() {
        let app = app_with_store(Arc::new(DownStore));
        let (status, body) = get_json(&app, "/api/leaderboard/bts").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");
    }
}
