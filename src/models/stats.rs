//! Persisted counters and the derived leaderboard views.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CollectionId, Item, ItemId};

/// Win/battle counters for one item, as returned by the stats query.
///
/// Zeros mean "no record yet", not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub wins: u64,
    pub battles: u64,
}

impl ItemStats {
    pub fn win_rate(&self) -> f64 {
        crate::calculate::calculate_win_rate(self.wins, self.battles)
    }
}

/// Counters for one (collection, item) pair as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub item_id: ItemId,
    pub collection_id: CollectionId,
    pub wins: u64,
    pub battles: u64,
}

impl StatsRecord {
    pub fn stats(&self) -> ItemStats {
        ItemStats {
            wins: self.wins,
            battles: self.battles,
        }
    }
}

/// Ranking criterion for the leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Wins,
    #[serde(rename = "winrate")]
    WinRate,
}

/// A sort key other than `wins` or `winrate` was requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort key '{0}' (expected 'wins' or 'winrate')")]
pub struct UnknownSortKey(pub String);

impl std::str::FromStr for SortBy {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wins" => Ok(SortBy::Wins),
            "winrate" => Ok(SortBy::WinRate),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortBy::Wins => write!(f, "wins"),
            SortBy::WinRate => write!(f, "winrate"),
        }
    }
}

/// One ranked row. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub item_id: ItemId,
    pub wins: u64,
    pub battles: u64,
    /// Percentage in `[0, 100]`, rounded to two decimals.
    pub win_rate: f64,
    /// Display metadata from the catalog, when it could be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

impl LeaderboardEntry {
    pub fn from_record(record: &StatsRecord) -> Self {
        Self {
            item_id: record.item_id.clone(),
            wins: record.wins,
            battles: record.battles,
            win_rate: record.stats().win_rate(),
            item: None,
        }
    }
}

/// Aggregates over every record in the collection, not just the top N.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardTotals {
    pub total_battles: u64,
    pub total_wins: u64,
    pub items_with_stats: u64,
}

/// Bounded, ranked view over a collection's stats.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub collection_id: CollectionId,
    pub entries: Vec<LeaderboardEntry>,
    /// Number of ranked items before truncation.
    pub total: usize,
    pub totals: LeaderboardTotals,
    pub sorted_by: SortBy,
}
