//! Session registry, matchmaking and ranking for concurrent Othello matches.
//!
//! The transport layer drives a [`SessionManager`] and renders the
//! [`SessionEvent`]s it broadcasts. Player records live behind the
//! [`PlayerRepository`] trait.

pub mod config;
pub mod persistence;
pub mod scoreboard;
pub mod session;
pub mod stats;

pub use persistence::{PersistenceError, PlayerRecord, PlayerRepository, PlayerStore};
pub use scoreboard::{ScoreRecord, Scoreboard, ScoreboardError, Standing};
pub use session::{
    EndReason, FinishedMatch, MatchSnapshot, MoveReport, QueueOutcome, RematchOutcome,
    ReplayView, SessionConfig, SessionError, SessionEvent, SessionManager,
};
pub use stats::StatsSnapshot;
