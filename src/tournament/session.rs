//! Glue between the pure engine and the stats store.

use serde::Serialize;
use tracing::warn;

use super::{Progress, TournamentError, TournamentState, VoteEvent};
use crate::models::ItemId;
use crate::stats::VoteRecorder;

/// Outcome of [`advance`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advance {
    pub state: TournamentState,
    pub vote: VoteEvent,
    /// False when the vote could not be persisted. The run still moves on.
    pub recorded: bool,
    pub progress: Progress,
}

/// Apply a vote and persist it.
///
/// A store failure is logged and reported through `recorded`; it never
/// blocks the tournament. Engine errors are returned and nothing is written.
pub async fn advance(
    state: &TournamentState,
    winner_id: &ItemId,
    recorder: &VoteRecorder,
) -> Result<Advance, TournamentError> {
    let transition = state.cast_vote(winner_id)?;

    let recorded = match recorder.record(&transition.vote).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                run = %transition.state.run_id,
                collection = %transition.vote.collection_id,
                winner = %transition.vote.winner_id,
                loser = %transition.vote.loser_id,
                "Failed to record vote: {}",
                e
            );
            false
        }
    };

    let progress = transition.state.progress();
    Ok(Advance {
        state: transition.state,
        vote: transition.vote,
        recorded,
        progress,
    })
}
