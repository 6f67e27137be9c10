//! Othello rules: board, capture rule, turn passing and scoring.
//!
//! Pure and synchronous. Sessions, persistence and transport live elsewhere.

pub mod board;
pub mod game;
pub mod replay;
pub mod types;

pub use board::Board;
pub use game::{Match, MoveError, Outcome, PlyOutcome};
pub use replay::{replay, replay_from, ReplayError};
pub use types::{
    Coord, CoordError, Direction, Disk, MatchId, Participant, PlayerId, Side, BOARD_SIZE,
};
