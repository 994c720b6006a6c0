use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::config::LeaderboardConfig;
use crate::stats::{LeaderboardRanker, StatsStore, VoteRecorder};

#[derive(Clone)]
pub struct AppState {
    pub recorder: VoteRecorder,
    pub ranker: LeaderboardRanker,
    pub catalog: Arc<CatalogService>,
    pub leaderboard: LeaderboardConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StatsStore>,
        catalog: Arc<CatalogService>,
        leaderboard: LeaderboardConfig,
    ) -> Self {
        Self {
            recorder: VoteRecorder::new(store.clone()),
            ranker: LeaderboardRanker::new(store),
            catalog,
            leaderboard,
        }
    }
}
