use othello::{MatchId, MoveError};

use crate::persistence::PersistenceError;

/// Per-request failures of the session manager.
///
/// Display strings are written for the player who made the request.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("Game is too old!")]
    NoActiveMatch,
    #[error("Invitation is too old!")]
    InviteExpired,
    #[error("Rematch request is too old!")]
    RematchOfferMissing,
    #[error("Replay is too old!")]
    ReplayExpired,
    #[error("Game is too old!")]
    UnknownMatch(MatchId),

    #[error("You can't play with yourself!")]
    SelfPairing,
    #[error("{name} is playing another game")]
    AlreadyPlaying { name: String },
    #[error("You can't end the game in your turn.")]
    CannotEndOnOwnTurn,
    #[error("You can end the game if your opponent doesn't place a disk for {remaining_secs} seconds.")]
    OpponentStillActive { remaining_secs: u64 },
    #[error("You are not part of this game.")]
    NotAParticipant,
    #[error("Malformed replay token: {0}")]
    InvalidReplayToken(String),

    #[error("Storage error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl SessionError {
    /// The request referred to a match, invite, offer or replay that no longer exists.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::NoActiveMatch
                | Self::InviteExpired
                | Self::RematchOfferMissing
                | Self::ReplayExpired
                | Self::UnknownMatch(_)
        )
    }

    /// Text safe to show the requesting player.
    pub fn user_message(&self) -> String {
        match self {
            Self::Persistence(_) => "Something went wrong, please try again later.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Report a broken registry invariant and abort the current task.
///
/// Only for states the registry guarantees can never happen; anything a
/// client can cause goes through [`SessionError`].
#[track_caller]
pub(crate) fn invariant_violated(what: std::fmt::Arguments<'_>) -> ! {
    tracing::error!("Invariant violated: {}", what);
    panic!("invariant violated: {}", what);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_classification() {
        assert!(SessionError::NoActiveMatch.is_stale());
        assert!(SessionError::InviteExpired.is_stale());
        assert!(SessionError::UnknownMatch(MatchId::new("m")).is_stale());
        assert!(!SessionError::SelfPairing.is_stale());
        assert!(!SessionError::Move(MoveError::NotYourTurn).is_stale());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            SessionError::Move(MoveError::CellOccupied).user_message(),
            "That cell is not empty!"
        );
        assert_eq!(
            SessionError::OpponentStillActive { remaining_secs: 80 }.user_message(),
            "You can end the game if your opponent doesn't place a disk for 80 seconds."
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = SessionError::from(PersistenceError::from(io));
        assert!(!err.user_message().contains("disk full"));
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn test_invariant_violated_panics() {
        invariant_violated(format_args!("player {} has no match", 1));
    }
}
