//! Applies vote events to the stats store.

use std::sync::Arc;

use tracing::debug;

use super::{
    counter, stats_key, StatsError, StatsStore, StoreError, FIELD_BATTLES, FIELD_WINS,
};
use crate::models::{CollectionId, ItemId, ItemStats, ValidationError};
use crate::tournament::VoteEvent;

/// Turns one vote into three counter increments.
///
/// Each call is applied exactly once; retries are the caller's business.
#[derive(Clone)]
pub struct VoteRecorder {
    store: Arc<dyn StatsStore>,
}

impl VoteRecorder {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// winner.wins += 1, winner.battles += 1, loser.battles += 1.
    ///
    /// Both `battles` increments land before the `wins` increment, so a
    /// concurrent reader never sees `wins > battles`.
    pub async fn record_vote(
        &self,
        collection: &CollectionId,
        winner: &ItemId,
        loser: &ItemId,
    ) -> Result<(), StatsError> {
        if winner == loser {
            return Err(ValidationError::Malformed {
                field: "loserId",
                reason: "winner and loser must differ".to_string(),
            }
            .into());
        }

        let winner_key = stats_key(collection, winner);
        let loser_key = stats_key(collection, loser);

        tokio::try_join!(
            self.store.increment(&winner_key, FIELD_BATTLES, 1),
            self.store.increment(&loser_key, FIELD_BATTLES, 1),
        )?;
        self.store.increment(&winner_key, FIELD_WINS, 1).await?;

        debug!(
            collection = %collection,
            winner = %winner,
            loser = %loser,
            "Recorded vote"
        );
        Ok(())
    }

    pub async fn record(&self, vote: &VoteEvent) -> Result<(), StatsError> {
        self.record_vote(&vote.collection_id, &vote.winner_id, &vote.loser_id)
            .await
    }

    /// Counters for one item; zeros when it has never been voted on.
    pub async fn stats(
        &self,
        collection: &CollectionId,
        item: &ItemId,
    ) -> Result<ItemStats, StoreError> {
        let key = stats_key(collection, item);
        let fields = self.store.get_fields(&key).await?;
        Ok(ItemStats {
            wins: counter(&fields, &key, FIELD_WINS)?,
            battles: counter(&fields, &key, FIELD_BATTLES)?,
        })
    }
}
