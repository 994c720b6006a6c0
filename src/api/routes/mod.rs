pub mod catalog;
pub mod leaderboard;
pub mod tournament;
pub mod vote;

pub async fn health() -> &'static str {
    "ok"
}
