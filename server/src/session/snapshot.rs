use std::collections::BTreeSet;

use othello::{replay_from, Board, Coord, Match, MatchId, Participant, PlayerId, ReplayError, Side};

use super::archive::ReplayRequest;

/// Immutable view of a running match, enough to render a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub participants: [Participant; 2],
    pub board: Board,
    pub active_side: Side,
    /// Light and dark disk counts.
    pub disks: [usize; 2],
    /// Only set when the active participant chose to see legal moves.
    pub legal_targets: Option<BTreeSet<Coord>>,
    pub move_count: usize,
}

impl MatchSnapshot {
    pub(crate) fn of(game: &Match) -> Self {
        Self {
            match_id: game.id().clone(),
            participants: game.participants().clone(),
            board: game.board().clone(),
            active_side: game.active_side(),
            disks: [game.disks(Side::First), game.disks(Side::Second)],
            legal_targets: Some(game.legal_targets().clone()),
            move_count: game.history().len(),
        }
    }

    pub fn participant(&self, side: Side) -> &Participant {
        match side {
            Side::First => &self.participants[0],
            Side::Second => &self.participants[1],
        }
    }

    pub fn active_participant(&self) -> &Participant {
        self.participant(self.active_side)
    }

    pub fn render(&self) -> String {
        self.board.render(self.legal_targets.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Neither side could move.
    Completed,
    Surrendered,
    /// Forced by the waiting side after the opponent idled too long.
    Inactivity,
}

/// Everything needed to render an outcome and replay the match later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedMatch {
    pub match_id: MatchId,
    pub participants: [Participant; 2],
    pub starting_side: Side,
    pub opening: Board,
    pub history: Vec<Coord>,
    pub final_board: Board,
    pub disks: [usize; 2],
    /// `None` on a draw.
    pub winner: Option<PlayerId>,
    pub reason: EndReason,
}

impl FinishedMatch {
    pub(crate) fn of(game: &Match, reason: EndReason, winner: Option<PlayerId>) -> Self {
        Self {
            match_id: game.id().clone(),
            participants: game.participants().clone(),
            starting_side: game.starting_side(),
            opening: game.opening().clone(),
            history: game.history().to_vec(),
            final_board: game.board().clone(),
            disks: [game.disks(Side::First), game.disks(Side::Second)],
            winner,
            reason,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    pub fn loser(&self) -> Option<PlayerId> {
        let winner = self.winner?;
        self.participants
            .iter()
            .map(|p| p.id)
            .find(|&id| id != winner)
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.participants.iter().any(|p| p.id == player)
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<&Participant> {
        if !self.involves(player) {
            return None;
        }
        self.participants.iter().find(|p| p.id != player)
    }

    /// Token the transport hands back to request the replay.
    pub fn replay_token(&self) -> String {
        ReplayRequest {
            starting_side: self.starting_side,
            match_id: self.match_id.clone(),
        }
        .to_string()
    }

    /// Board after every ply, starting from the opening position.
    pub fn frames(&self) -> Result<Vec<Board>, ReplayError> {
        replay_from(self.opening.clone(), self.starting_side, &self.history)
    }

    /// Caption for a replay: both names with their final disk counts.
    pub fn summary(&self) -> String {
        format!(
            "Light: {} | Score: {}\nDark: {} | Score: {}",
            self.participants[0].name, self.disks[0], self.participants[1].name, self.disks[1]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Match {
        Match::with_starting_side(
            MatchId::new("g1"),
            Participant::new(1, "Alice"),
            Participant::new(2, "Bob"),
            Side::First,
        )
    }

    #[test]
    fn test_snapshot_of_new_match() {
        let snap = MatchSnapshot::of(&game());
        assert_eq!(snap.disks, [2, 2]);
        assert_eq!(snap.active_participant().name, "Alice");
        assert_eq!(snap.legal_targets.as_ref().map(|t| t.len()), Some(4));
        assert_eq!(snap.render().matches('*').count(), 4);
    }

    #[test]
    fn test_finished_match_queries() {
        let mut g = game();
        let at = Coord::new(2, 4).unwrap();
        g.place_disk(at, PlayerId(1)).unwrap();

        let done = FinishedMatch::of(&g, EndReason::Surrendered, Some(PlayerId(2)));
        assert_eq!(done.loser(), Some(PlayerId(1)));
        assert_eq!(done.opponent_of(PlayerId(2)).map(|p| p.id), Some(PlayerId(1)));
        assert_eq!(done.opponent_of(PlayerId(3)), None);
        assert_eq!(done.replay_token(), "replaywg1");
        assert!(done.summary().contains("Alice | Score: 4"));

        let frames = done.frames().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], done.final_board);
    }
}
