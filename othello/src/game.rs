use std::collections::BTreeSet;

use rand::Rng;

use crate::board::Board;
use crate::types::{Coord, Disk, MatchId, Participant, PlayerId, Side};

/// One Othello match between two fixed participants.
///
/// No internal locking: callers guarantee a single writer.
#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    participants: [Participant; 2],
    opening: Board,
    board: Board,
    active: Side,
    legal_targets: BTreeSet<Coord>,
    history: Vec<Coord>,
    starting_side: Side,
    disk_counts: [usize; 2],
    ended: bool,
}

/// What a successful placement did to the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyOutcome {
    pub placed: Coord,
    pub flipped: Vec<Coord>,
    /// The opponent had no legal target and was skipped.
    pub passed: bool,
    pub ended: bool,
}

/// Final result by disk count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Side),
    Draw,
}

impl Match {
    /// Create a match with a uniformly random starting side drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(
        id: MatchId,
        first: Participant,
        second: Participant,
        rng: &mut R,
    ) -> Self {
        let starting_side = if rng.gen_bool(0.5) {
            Side::First
        } else {
            Side::Second
        };
        Self::with_starting_side(id, first, second, starting_side)
    }

    pub fn with_starting_side(
        id: MatchId,
        first: Participant,
        second: Participant,
        starting_side: Side,
    ) -> Self {
        Self::from_position(id, first, second, Board::initial(), starting_side)
    }

    /// Resume play from an arbitrary `opening` with `to_move` on turn.
    ///
    /// Pass and end rules apply to the opening itself: if `to_move` has no
    /// target the other side starts, and if neither has one the match is
    /// already over.
    pub fn from_position(
        id: MatchId,
        first: Participant,
        second: Participant,
        opening: Board,
        to_move: Side,
    ) -> Self {
        let mut starting_side = to_move;
        let mut legal_targets = opening.legal_targets(to_move.disk());
        if legal_targets.is_empty() {
            let other = opening.legal_targets(to_move.other().disk());
            if !other.is_empty() {
                starting_side = to_move.other();
                legal_targets = other;
            }
        }
        let ended = legal_targets.is_empty();
        Self {
            id,
            participants: [first, second],
            disk_counts: [opening.count(Disk::Light), opening.count(Disk::Dark)],
            board: opening.clone(),
            opening,
            active: starting_side,
            legal_targets,
            history: Vec::with_capacity(60),
            starting_side,
            ended,
        }
    }

    pub fn id(&self) -> &MatchId {
        &self.id
    }

    pub fn participants(&self) -> &[Participant; 2] {
        &self.participants
    }

    pub fn participant(&self, side: Side) -> &Participant {
        &self.participants[side.index()]
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_side(&self) -> Side {
        self.active
    }

    pub fn active_participant(&self) -> &Participant {
        self.participant(self.active)
    }

    pub fn legal_targets(&self) -> &BTreeSet<Coord> {
        &self.legal_targets
    }

    /// The position the match started from.
    pub fn opening(&self) -> &Board {
        &self.opening
    }

    /// Plies played so far, oldest first.
    pub fn history(&self) -> &[Coord] {
        &self.history
    }

    pub fn starting_side(&self) -> Side {
        self.starting_side
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn disks(&self, side: Side) -> usize {
        self.disk_counts[side.index()]
    }

    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        if self.participants[0].id == player {
            Some(Side::First)
        } else if self.participants[1].id == player {
            Some(Side::Second)
        } else {
            None
        }
    }

    pub fn is_turn_of(&self, player: PlayerId) -> bool {
        self.active_participant().id == player
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<&Participant> {
        self.side_of(player).map(|side| self.participant(side.other()))
    }

    /// Place a disk for `actor`. On error the match is left untouched.
    pub fn place_disk(&mut self, at: Coord, actor: PlayerId) -> Result<PlyOutcome, MoveError> {
        if self.ended {
            return Err(MoveError::MatchEnded);
        }
        if !self.is_turn_of(actor) {
            return Err(MoveError::NotYourTurn);
        }
        if self.board.get(at).is_some() {
            return Err(MoveError::CellOccupied);
        }
        if !self.legal_targets.contains(&at) {
            return Err(MoveError::IllegalTarget);
        }
        Ok(self.advance(at))
    }

    /// Apply a ply that is already known to be legal for the active side.
    pub(crate) fn advance(&mut self, at: Coord) -> PlyOutcome {
        let mover = self.active;
        let flipped = self.board.place(at, mover.disk());
        self.disk_counts = [
            self.board.count(Disk::Light),
            self.board.count(Disk::Dark),
        ];

        self.active = mover.other();
        self.legal_targets = self.board.legal_targets(self.active.disk());

        let mut passed = false;
        if self.legal_targets.is_empty() {
            self.active = mover;
            self.legal_targets = self.board.legal_targets(mover.disk());
            if self.legal_targets.is_empty() {
                self.ended = true;
            } else {
                passed = true;
            }
        }

        self.history.push(at);

        PlyOutcome {
            placed: at,
            flipped,
            passed,
            ended: self.ended,
        }
    }

    pub fn outcome(&self) -> Outcome {
        let light = self.disks(Side::First);
        let dark = self.disks(Side::Second);
        match light.cmp(&dark) {
            std::cmp::Ordering::Greater => Outcome::Winner(Side::First),
            std::cmp::Ordering::Less => Outcome::Winner(Side::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// The side with more disks, `None` on a draw.
    pub fn winner(&self) -> Option<Side> {
        match self.outcome() {
            Outcome::Winner(side) => Some(side),
            Outcome::Draw => None,
        }
    }

    pub fn loser(&self) -> Option<Side> {
        self.winner().map(Side::other)
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "match {} between {} and {}",
            self.id, self.participants[0].name, self.participants[1].name
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("It's not your turn!")]
    NotYourTurn,
    #[error("That cell is not empty!")]
    CellOccupied,
    #[error("You can't place a disk there!")]
    IllegalTarget,
    #[error("The match is already over!")]
    MatchEnded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn c(x: usize, y: usize) -> Coord {
        Coord::new(x, y).unwrap()
    }

    fn alice() -> Participant {
        Participant::new(1, "Alice")
    }

    fn bob() -> Participant {
        Participant::new(2, "Bob")
    }

    fn new_match(starting: Side) -> Match {
        Match::with_starting_side(MatchId::new("m1"), alice(), bob(), starting)
    }

    fn with_board(board: Board, active: Side) -> Match {
        Match::from_position(MatchId::new("m1"), alice(), bob(), board, active)
    }

    #[test]
    fn test_new_match_initial_state() {
        let m = new_match(Side::First);
        assert_eq!(m.disks(Side::First), 2);
        assert_eq!(m.disks(Side::Second), 2);
        assert_eq!(m.legal_targets().len(), 4);
        assert!(m.history().is_empty());
        assert!(!m.is_ended());
        assert!(m.is_turn_of(PlayerId(1)));
        assert_eq!(m.opponent_of(PlayerId(1)), Some(&bob()));
        assert_eq!(m.opponent_of(PlayerId(99)), None);
    }

    #[test]
    fn test_starting_side_follows_rng() {
        let mut seen_first = false;
        let mut seen_second = false;
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let m = Match::new(MatchId::new("m"), alice(), bob(), &mut rng);
            assert_eq!(m.active_side(), m.starting_side());
            match m.starting_side() {
                Side::First => seen_first = true,
                Side::Second => seen_second = true,
            }
        }
        assert!(seen_first && seen_second);

        let a = Match::new(MatchId::new("a"), alice(), bob(), &mut StdRng::seed_from_u64(7));
        let b = Match::new(MatchId::new("b"), alice(), bob(), &mut StdRng::seed_from_u64(7));
        assert_eq!(a.starting_side(), b.starting_side());
    }

    #[test]
    fn test_light_opening_capture_east() {
        let mut m = new_match(Side::First);
        let outcome = m.place_disk(c(2, 4), PlayerId(1)).unwrap();

        assert_eq!(outcome.flipped, vec![c(3, 4)]);
        assert!(!outcome.passed);
        assert!(!outcome.ended);
        assert_eq!(m.board().get(c(2, 4)), Some(Disk::Light));
        assert_eq!(m.board().get(c(3, 4)), Some(Disk::Light));
        assert_eq!(m.board().get(c(4, 4)), Some(Disk::Light));
        assert_eq!(m.active_side(), Side::Second);
        assert_eq!(m.disks(Side::First), 4);
        assert_eq!(m.disks(Side::Second), 1);
        assert_eq!(m.history(), &[c(2, 4)]);
    }

    #[test]
    fn test_not_your_turn_leaves_match_unchanged() {
        let mut m = new_match(Side::First);
        let before = m.board().clone();
        assert_eq!(m.place_disk(c(3, 2), PlayerId(2)), Err(MoveError::NotYourTurn));
        assert_eq!(m.place_disk(c(2, 4), PlayerId(42)), Err(MoveError::NotYourTurn));
        assert_eq!(m.board(), &before);
        assert_eq!(m.active_side(), Side::First);
        assert!(m.history().is_empty());
    }

    #[test]
    fn test_occupied_and_illegal_targets() {
        let mut m = new_match(Side::First);
        let before = m.board().clone();
        assert_eq!(m.place_disk(c(3, 3), PlayerId(1)), Err(MoveError::CellOccupied));
        assert_eq!(m.place_disk(c(0, 0), PlayerId(1)), Err(MoveError::IllegalTarget));
        // Legal for dark, not for light.
        assert_eq!(m.place_disk(c(3, 2), PlayerId(1)), Err(MoveError::IllegalTarget));
        assert_eq!(m.board(), &before);
    }

    #[test]
    fn test_pass_then_end() {
        let mut board = Board::empty();
        board.set(c(0, 0), Disk::Light);
        board.set(c(1, 0), Disk::Dark);
        board.set(c(6, 5), Disk::Dark);
        board.set(c(7, 5), Disk::Light);
        let mut m = with_board(board, Side::First);

        // Dark has nothing to capture afterwards, so light moves again.
        let first = m.place_disk(c(2, 0), PlayerId(1)).unwrap();
        assert!(first.passed);
        assert!(!first.ended);
        assert_eq!(m.active_side(), Side::First);
        assert!(m.is_turn_of(PlayerId(1)));

        let second = m.place_disk(c(5, 5), PlayerId(1)).unwrap();
        assert!(second.ended);
        assert!(!second.passed);
        assert!(m.is_ended());
        assert_eq!(m.history(), &[c(2, 0), c(5, 5)]);
        assert_eq!(m.disks(Side::First) + m.disks(Side::Second), 4 + 2);
        assert_eq!(m.winner(), Some(Side::First));
        assert_eq!(m.loser(), Some(Side::Second));
        assert_eq!(
            m.place_disk(c(0, 7), PlayerId(1)),
            Err(MoveError::MatchEnded)
        );
    }

    #[test]
    fn test_from_position_skips_side_without_targets() {
        let board = Board::from_disks([(c(0, 0), Disk::Light), (c(1, 0), Disk::Dark)]);
        let m = Match::from_position(MatchId::new("m1"), alice(), bob(), board.clone(), Side::Second);
        assert_eq!(m.active_side(), Side::First);
        assert_eq!(m.starting_side(), Side::First);
        assert_eq!(m.opening(), &board);
        assert_eq!(m.legal_targets().iter().copied().collect::<Vec<_>>(), vec![c(2, 0)]);
        assert!(!m.is_ended());

        let stuck = Board::from_disks([(c(0, 0), Disk::Light)]);
        let m = Match::from_position(MatchId::new("m2"), alice(), bob(), stuck, Side::First);
        assert!(m.is_ended());
        assert_eq!(m.winner(), Some(Side::First));
    }

    #[test]
    fn test_draw_has_no_winner() {
        let mut board = Board::empty();
        board.set(c(0, 0), Disk::Light);
        board.set(c(7, 7), Disk::Dark);
        let m = with_board(board, Side::First);
        assert_eq!(m.outcome(), Outcome::Draw);
        assert_eq!(m.winner(), None);
        assert_eq!(m.loser(), None);
    }

    #[test]
    fn test_winner_by_count() {
        let mut board = Board::empty();
        board.set(c(0, 0), Disk::Dark);
        board.set(c(1, 0), Disk::Dark);
        board.set(c(7, 7), Disk::Light);
        let m = with_board(board, Side::First);
        assert_eq!(m.winner(), Some(Side::Second));
    }

    proptest! {
        #[test]
        fn prop_disk_count_tracks_history(
            start_first in any::<bool>(),
            picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..64),
        ) {
            let start = if start_first { Side::First } else { Side::Second };
            let mut m = new_match(start);
            for pick in picks {
                if m.is_ended() {
                    break;
                }
                let targets: Vec<Coord> = m.legal_targets().iter().copied().collect();
                prop_assert!(!targets.is_empty());
                let at = targets[pick.index(targets.len())];
                let actor = m.active_participant().id;
                m.place_disk(at, actor).unwrap();

                prop_assert_eq!(
                    m.disks(Side::First) + m.disks(Side::Second),
                    4 + m.history().len()
                );
                prop_assert_eq!(m.legal_targets(), &m.board().legal_targets(m.active_side().disk()));
            }
        }

        #[test]
        fn prop_rejected_moves_do_not_mutate(x in 0usize..8, y in 0usize..8, wrong_player in any::<bool>()) {
            let mut m = new_match(Side::First);
            let at = Coord::new(x, y).unwrap();
            let actor = if wrong_player { PlayerId(2) } else { PlayerId(1) };
            let before = m.board().clone();
            if m.place_disk(at, actor).is_err() {
                prop_assert_eq!(m.board(), &before);
                prop_assert_eq!(m.active_side(), Side::First);
                prop_assert!(m.history().is_empty());
            } else {
                prop_assert!(!wrong_player);
                prop_assert!(before.is_legal_target(at, Disk::Light));
            }
        }
    }
}
