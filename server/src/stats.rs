use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the current day. Reset by the maintenance task.
#[derive(Debug, Default)]
pub struct DailyStats {
    games_played: AtomicU64,
    players_joined: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub games_played_today: u64,
    pub players_joined_today: u64,
    pub total_players: usize,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Games played today: {}\nPlayers joined today: {}\nTotal players: {}",
            self.games_played_today, self.players_joined_today, self.total_players
        )
    }
}

impl DailyStats {
    pub fn game_played(&self) {
        self.games_played.fetch_add(1, Ordering::Relaxed);
    }

    pub fn player_joined(&self) {
        self.players_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_players: usize) -> StatsSnapshot {
        StatsSnapshot {
            games_played_today: self.games_played.load(Ordering::Relaxed),
            players_joined_today: self.players_joined.load(Ordering::Relaxed),
            total_players,
        }
    }

    /// Start a new day. Returns the counters of the day that ended.
    pub fn roll_over(&self) -> (u64, u64) {
        (
            self.games_played.swap(0, Ordering::Relaxed),
            self.players_joined.swap(0, Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_roll_over() {
        let stats = DailyStats::default();
        stats.game_played();
        stats.game_played();
        stats.player_joined();

        let snap = stats.snapshot(10);
        assert_eq!(snap.games_played_today, 2);
        assert_eq!(snap.players_joined_today, 1);
        assert!(snap.to_string().contains("Total players: 10"));

        assert_eq!(stats.roll_over(), (2, 1));
        assert_eq!(stats.snapshot(10).games_played_today, 0);
    }
}
