//! Leaderboard ranking.
//!
//! Reads every record of a collection with one prefix scan and ranks them in
//! memory. The scan is not a snapshot: a vote landing mid-scan may be only
//! partly visible.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    collection_prefix, counter, item_id_from_key, StatsError, StatsStore, StoreError,
    FIELD_BATTLES, FIELD_WINS,
};
use crate::calculate::win_rates_tied;
use crate::models::{
    CollectionId, Leaderboard, LeaderboardEntry, LeaderboardTotals, SortBy, StatsRecord,
    ValidationError,
};

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Clone)]
pub struct LeaderboardRanker {
    store: Arc<dyn StatsStore>,
}

impl LeaderboardRanker {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// Every record of the collection with at least one battle, in store order.
    pub async fn records(&self, collection: &CollectionId) -> Result<Vec<StatsRecord>, StoreError> {
        let rows = self
            .store
            .scan_by_prefix(&collection_prefix(collection))
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for (key, fields) in rows {
            let Some(item_id) = item_id_from_key(collection, &key) else {
                warn!("Skipping stats key with unexpected shape: {}", key);
                continue;
            };
            let record = StatsRecord {
                item_id,
                collection_id: collection.clone(),
                wins: counter(&fields, &key, FIELD_WINS)?,
                battles: counter(&fields, &key, FIELD_BATTLES)?,
            };
            if record.battles > 0 {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Rank a collection and keep the top `limit` entries.
    ///
    /// Store failures are returned as-is; an unreachable store never yields
    /// an empty leaderboard.
    pub async fn compute(
        &self,
        collection: &CollectionId,
        sort_by: SortBy,
        limit: usize,
    ) -> Result<Leaderboard, StatsError> {
        if limit == 0 {
            return Err(ValidationError::Malformed {
                field: "limit",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        let records = self.records(collection).await?;
        let leaderboard = build_leaderboard(collection, &records, sort_by, limit);

        debug!(
            collection = %collection,
            sort = %sort_by,
            ranked = leaderboard.total,
            returned = leaderboard.entries.len(),
            "Computed leaderboard"
        );
        Ok(leaderboard)
    }
}

/// Totals across all records, independent of the top-N cut.
pub fn totals(records: &[StatsRecord]) -> LeaderboardTotals {
    records.iter().fold(LeaderboardTotals::default(), |mut acc, r| {
        acc.total_battles += r.battles;
        acc.total_wins += r.wins;
        if r.battles > 0 {
            acc.items_with_stats += 1;
        }
        acc
    })
}

/// `Greater` when `a` should rank after `b`.
fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Wins => b.wins.cmp(&a.wins),
        SortBy::WinRate => {
            if win_rates_tied(a.win_rate, b.win_rate) {
                b.battles.cmp(&a.battles)
            } else {
                b.win_rate.total_cmp(&a.win_rate)
            }
        }
    }
}

/// Stable ranking.
///
/// Wins is a total order and goes through `sort_by`. The win-rate tolerance
/// makes that comparator non-transitive, which `sort_by` does not allow, so
/// win-rate ranking is an insertion sort: O(n²) over every record of the
/// collection, which stays small at catalog sizes (a few hundred tracks).
fn rank(entries: &mut [LeaderboardEntry], sort_by: SortBy) {
    if sort_by == SortBy::Wins {
        entries.sort_by(|a, b| compare(a, b, sort_by));
        return;
    }

    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && compare(&entries[j - 1], &entries[j], sort_by) == Ordering::Greater {
            entries.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Rank `records` and truncate to `limit`. Pure; the store is not touched.
pub fn build_leaderboard(
    collection: &CollectionId,
    records: &[StatsRecord],
    sort_by: SortBy,
    limit: usize,
) -> Leaderboard {
    let mut entries: Vec<LeaderboardEntry> =
        records.iter().map(LeaderboardEntry::from_record).collect();
    rank(&mut entries, sort_by);

    let total = entries.len();
    entries.truncate(limit);

    Leaderboard {
        collection_id: collection.clone(),
        entries,
        total,
        totals: totals(records),
        sorted_by: sort_by,
    }
}
