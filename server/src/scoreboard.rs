//! Players ordered by score, kept sorted by local moves instead of full re-sorts.

use std::fmt;

use othello::PlayerId;

use crate::persistence::PlayerRecord;

/// Ranks shown from the top before the viewer's own window.
const TOP_RANKS: usize = 3;
/// Ranks shown above and below the viewer.
const WINDOW_RANKS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub player_id: PlayerId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl ScoreRecord {
    /// Draws carry no weight.
    pub fn score(&self) -> i64 {
        3 * i64::from(self.wins) - i64::from(self.losses)
    }
}

impl From<&PlayerRecord> for ScoreRecord {
    fn from(record: &PlayerRecord) -> Self {
        Self {
            player_id: record.player_id,
            name: record.name.clone(),
            wins: record.wins,
            losses: record.losses,
            draws: record.draws,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoreboardError {
    #[error("Player {0} is not on the scoreboard")]
    UnknownPlayer(PlayerId),
}

/// One rendered line of the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub rank: usize,
    pub record: ScoreRecord,
}

/// Score-descending list. Equal scores keep their insertion order.
#[derive(Debug, Default, Clone)]
pub struct Scoreboard {
    records: Vec<ScoreRecord>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ScoreRecord>) -> Self {
        let mut board = Self::new();
        for record in records {
            board.insert(record);
        }
        board
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.position_of(player).is_some()
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    fn position_of(&self, player: PlayerId) -> Option<usize> {
        self.records.iter().position(|r| r.player_id == player)
    }

    /// Insert behind every record with a score at least as high.
    ///
    /// A player already present is replaced by the new record.
    pub fn insert(&mut self, record: ScoreRecord) {
        if let Some(existing) = self.position_of(record.player_id) {
            self.records.remove(existing);
        }
        let score = record.score();
        let mut pos = self.records.len();
        while pos > 0 && self.records[pos - 1].score() < score {
            pos -= 1;
        }
        self.records.insert(pos, record);
    }

    /// Add to a player's counters and move them to their new place.
    pub fn apply_delta(
        &mut self,
        player: PlayerId,
        wins_delta: u32,
        losses_delta: u32,
    ) -> Result<(), ScoreboardError> {
        self.update(player, |r| {
            r.wins += wins_delta;
            r.losses += losses_delta;
        })
    }

    /// Draws leave the score untouched, so the order never changes.
    pub fn record_draw(&mut self, player: PlayerId) -> Result<(), ScoreboardError> {
        self.update(player, |r| r.draws += 1)
    }

    fn update(
        &mut self,
        player: PlayerId,
        f: impl FnOnce(&mut ScoreRecord),
    ) -> Result<(), ScoreboardError> {
        let mut pos = self
            .position_of(player)
            .ok_or(ScoreboardError::UnknownPlayer(player))?;
        f(&mut self.records[pos]);
        let score = self.records[pos].score();

        while pos > 0 && self.records[pos - 1].score() < score {
            self.records.swap(pos - 1, pos);
            pos -= 1;
        }
        while pos + 1 < self.records.len() && self.records[pos + 1].score() > score {
            self.records.swap(pos, pos + 1);
            pos += 1;
        }
        Ok(())
    }

    /// Dense rank starting at 1.
    pub fn rank_of(&self, player: PlayerId) -> Result<usize, ScoreboardError> {
        self.ranked()
            .find(|s| s.record.player_id == player)
            .map(|s| s.rank)
            .ok_or(ScoreboardError::UnknownPlayer(player))
    }

    fn ranked(&self) -> impl Iterator<Item = Standing> + '_ {
        let mut rank = 0;
        let mut previous = None;
        self.records.iter().map(move |record| {
            let score = record.score();
            if previous != Some(score) {
                rank += 1;
                previous = Some(score);
            }
            Standing {
                rank,
                record: record.clone(),
            }
        })
    }

    /// Top ranks, then the ranks around `viewer` when they are not already shown.
    pub fn view(&self, viewer: Option<PlayerId>) -> Vec<Standing> {
        let viewer_rank = viewer.and_then(|id| self.rank_of(id).ok());
        self.ranked()
            .filter(|s| {
                s.rank <= TOP_RANKS
                    || viewer_rank.is_some_and(|r| s.rank.abs_diff(r) <= WINDOW_RANKS)
            })
            .collect()
    }

    /// Text rendering of [`Scoreboard::view`]; a gap between blocks is shown as `...`.
    pub fn render(&self, viewer: Option<PlayerId>) -> String {
        let mut out = String::new();
        let mut last_rank = 0;
        for standing in self.view(viewer) {
            if standing.rank > last_rank + 1 {
                out.push_str("...\n");
            }
            last_rank = standing.rank;
            let marker = if Some(standing.record.player_id) == viewer {
                " <"
            } else {
                ""
            };
            out.push_str(&format!(
                "{}. {} {}{}\n",
                standing.rank,
                standing.record.name,
                standing.record.score(),
                marker
            ));
        }
        out
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}
