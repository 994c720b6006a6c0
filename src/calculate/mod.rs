//! Win-rate arithmetic shared by the stats query and the leaderboard.

/// Two win rates closer than this (in percentage points) are treated as tied.
pub const WIN_RATE_TIE_TOLERANCE: f64 = 0.1;

/// Win rate as a percentage rounded to two decimals; 0 when no battles.
pub fn calculate_win_rate(wins: u64, battles: u64) -> f64 {
    if battles == 0 {
        0.0
    } else {
        round2(wins as f64 / battles as f64 * 100.0)
    }
}

/// Whether two percentage win rates fall within the tie tolerance.
pub fn win_rates_tied(a: f64, b: f64) -> bool {
    (a - b).abs() < WIN_RATE_TIE_TOLERANCE
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_win_rate() {
        assert_eq!(calculate_win_rate(9, 10), 90.0);
        assert_eq!(calculate_win_rate(1, 1), 100.0);
        assert_eq!(calculate_win_rate(1, 3), 33.33);
        assert_eq!(calculate_win_rate(0, 0), 0.0);
        assert_eq!(calculate_win_rate(0, 5), 0.0);
    }

    #[test]
    fn test_win_rates_tied() {
        assert!(win_rates_tied(50.0, 50.05));
        assert!(win_rates_tied(33.33, 33.4));
        assert!(!win_rates_tied(90.0, 100.0));
        assert!(!win_rates_tied(80.0, 90.0));
    }
}
