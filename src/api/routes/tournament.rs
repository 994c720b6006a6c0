//! Stateless tournament endpoints: the client holds the state and sends it
//! back with every transition.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{CollectionId, ItemId};
use crate::tournament::{advance, Advance, Progress, TournamentState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub state: TournamentState,
    pub progress: Progress,
}

impl From<TournamentState> for StateResponse {
    fn from(state: TournamentState) -> Self {
        let progress = state.progress();
        Self { state, progress }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    pub state: TournamentState,
    pub winner_id: ItemId,
}

#[derive(Debug, Deserialize)]
pub struct RestartBody {
    pub state: TournamentState,
}

pub async fn start(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let collection_id = CollectionId::parse(&collection_id)?;
    let items = state.catalog.load(&collection_id).await?;

    let run = TournamentState::start(collection_id, items, &mut rand::thread_rng())?;
    info!(
        run = %run.run_id,
        collection = %run.collection_id,
        entrants = run.entrants.len(),
        "Tournament started"
    );
    Ok(Json(run.into()))
}

pub async fn vote(
    State(state): State<AppState>,
    payload: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<Advance>, ApiError> {
    let Json(body) = payload?;
    let outcome = advance(&body.state, &body.winner_id, &state.recorder).await?;

    if let Some(survivor) = outcome.state.survivor() {
        info!(
            run = %outcome.state.run_id,
            survivor = %survivor.id,
            "Tournament complete"
        );
    }
    Ok(Json(outcome))
}

pub async fn restart(
    payload: Result<Json<RestartBody>, JsonRejection>,
) -> Result<Json<StateResponse>, ApiError> {
    let Json(body) = payload?;
    let run = body.state.restart(&mut rand::thread_rng())?;
    Ok(Json(run.into()))
}
