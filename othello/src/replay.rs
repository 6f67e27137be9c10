//! Rebuilds the sequence of positions of a finished match from its move history.

use crate::board::Board;
use crate::game::Match;
use crate::types::{Coord, MatchId, Participant, Side};

/// One frame per position: the opening board, then the board after each ply.
///
/// Pass rules are applied exactly as during play, so the history alone is
/// enough to recover whose disk each ply placed.
pub fn replay(starting_side: Side, moves: &[Coord]) -> Result<Vec<Board>, ReplayError> {
    replay_from(Board::initial(), starting_side, moves)
}

/// Like [`replay`], for a match resumed from `opening`.
pub fn replay_from(
    opening: Board,
    starting_side: Side,
    moves: &[Coord],
) -> Result<Vec<Board>, ReplayError> {
    let mut position = Match::from_position(
        MatchId::new("replay"),
        Participant::new(0, "first"),
        Participant::new(1, "second"),
        opening,
        starting_side,
    );

    let mut frames = Vec::with_capacity(moves.len() + 1);
    frames.push(position.board().clone());

    for (ply, &at) in moves.iter().enumerate() {
        if position.is_ended() || !position.legal_targets().contains(&at) {
            return Err(ReplayError::IllegalPly { ply, at });
        }
        position.advance(at);
        frames.push(position.board().clone());
    }

    Ok(frames)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("Ply {ply} at {at} is not legal in the reconstructed position")]
    IllegalPly { ply: usize, at: Coord },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Disk;

    fn c(x: usize, y: usize) -> Coord {
        Coord::new(x, y).unwrap()
    }

    #[test]
    fn test_replay_matches_live_play() {
        let mut live = Match::with_starting_side(
            MatchId::new("live"),
            Participant::new(10, "A"),
            Participant::new(20, "B"),
            Side::Second,
        );
        let mut boards = vec![live.board().clone()];
        for _ in 0..12 {
            if live.is_ended() {
                break;
            }
            let at = *live.legal_targets().iter().next().unwrap();
            let actor = live.active_participant().id;
            live.place_disk(at, actor).unwrap();
            boards.push(live.board().clone());
        }

        let frames = replay(Side::Second, live.history()).unwrap();
        assert_eq!(frames, boards);
    }

    #[test]
    fn test_replay_from_custom_opening() {
        let opening = Board::from_disks([
            (c(0, 0), Disk::Light),
            (c(1, 0), Disk::Dark),
            (c(6, 5), Disk::Dark),
            (c(7, 5), Disk::Light),
        ]);
        // Dark passes after the first ply, so light places both disks.
        let frames = replay_from(opening.clone(), Side::First, &[c(2, 0), c(5, 5)]).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], opening);
        assert_eq!(frames[2].count(Disk::Light), 6);
        assert_eq!(frames[2].count(Disk::Dark), 0);

        assert!(replay(Side::First, &[c(2, 0)]).is_err());
    }

    #[test]
    fn test_replay_empty_history_is_opening() {
        let frames = replay(Side::First, &[]).unwrap();
        assert_eq!(frames, vec![Board::initial()]);
    }

    #[test]
    fn test_replay_rejects_wrong_starting_side() {
        // (2, 4) is a light opening; dark cannot play it first.
        let err = replay(Side::Second, &[c(2, 4)]).unwrap_err();
        assert_eq!(err, ReplayError::IllegalPly { ply: 0, at: c(2, 4) });

        let frames = replay(Side::First, &[c(2, 4)]).unwrap();
        assert_eq!(frames[1].get(c(3, 4)), Some(Disk::Light));
    }
}
