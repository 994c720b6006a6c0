//! # Track Duel
//!
//! Head-to-head "which track do you prefer?" tournaments over a music
//! catalog, with persistent per-track stats and leaderboards.
//!
//! ## Architecture
//!
//! - **models**: Identifiers, catalog items, stats and leaderboard views
//! - **catalog**: Catalog sources, deduplication and the catalog cache
//! - **tournament**: The king-of-the-hill engine and vote persistence glue
//! - **stats**: Stats store backends, vote recording and leaderboard ranking
//! - **storage**: Filesystem layout and JSONL helpers
//! - **api**: REST API endpoints
//! - **calculate**: Win-rate arithmetic
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod catalog;
pub mod config;
pub mod models;
pub mod stats;
pub mod storage;
pub mod tournament;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "24h", "30m", "90s", "7d").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('d') {
        (n, 86400)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.trim().parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_days() {
        assert_eq!(parse_duration("7d"), Some(Duration::from_secs(604800)));
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("24h"), Some(Duration::from_secs(86400)));
    }

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_parse_duration_default_seconds() {
        assert_eq!(parse_duration("120"), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(parse_duration(&format!("{}d", u64::MAX)), None);
    }
}
