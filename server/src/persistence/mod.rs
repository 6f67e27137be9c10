mod json_store;
mod player_store;
pub mod traits;

pub(crate) use json_store::{JsonStore, Storable};

pub use player_store::PlayerStore;
pub use traits::PlayerRepository;

use othello::PlayerId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No stored record for player {0}")]
    PlayerNotFound(PlayerId),
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Durable per-player record: result counters plus the board display preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    #[serde(default = "default_legal_moves_shown")]
    pub legal_moves_shown: bool,
    pub created_at: u64,
}

fn default_legal_moves_shown() -> bool {
    true
}

impl PlayerRecord {
    pub fn new(player_id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
            wins: 0,
            losses: 0,
            draws: 0,
            legal_moves_shown: true,
            created_at: now_timestamp(),
        }
    }

    pub fn matches_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Integer percentage of matches won, 0 before the first match.
    pub fn win_percentage(&self) -> u32 {
        match self.matches_played() {
            0 => 0,
            played => self.wins * 100 / played,
        }
    }

    pub fn profile(&self, rank: usize) -> String {
        format!(
            "{}'s Profile:\nRank: {}\nWins: {}\nLosses: {}\nDraws: {}\nWin Percentage: {}%",
            self.name,
            rank,
            self.wins,
            self.losses,
            self.draws,
            self.win_percentage()
        )
    }
}

impl Storable for PlayerRecord {
    fn key(&self) -> String {
        format!("player_{}", self.player_id)
    }
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_percentage() {
        let mut record = PlayerRecord::new(PlayerId(1), "Alice");
        assert_eq!(record.win_percentage(), 0);

        record.wins = 2;
        record.losses = 1;
        record.draws = 1;
        assert_eq!(record.matches_played(), 4);
        assert_eq!(record.win_percentage(), 50);

        record.wins = 1;
        record.losses = 2;
        record.draws = 0;
        assert_eq!(record.win_percentage(), 33);
    }

    #[test]
    fn test_legal_moves_default_on_for_old_records() {
        let json = r#"{"player_id":5,"name":"Old","wins":1,"losses":0,"draws":0,"created_at":0}"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();
        assert!(record.legal_moves_shown);
        assert_eq!(record.key(), "player_5");
    }
}
