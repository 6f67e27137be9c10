use othello::{MatchId, Participant, PlayerId};

use super::snapshot::{FinishedMatch, MatchSnapshot};

/// Events broadcast from the session manager to the transport.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SessionEvent {
    /// Two participants were paired; the first turn is ready to render.
    MatchStarted(MatchSnapshot),
    /// A ply was placed or the viewer toggled legal-move hints.
    BoardChanged(MatchSnapshot),
    /// Outcome recorded and both participants released.
    MatchEnded(FinishedMatch),
    RematchOffered {
        from: Participant,
        to: PlayerId,
        match_id: MatchId,
    },
    RematchRejected {
        requester: PlayerId,
        by: Participant,
    },
    /// The waiting participant left the random queue.
    QueueCancelled(PlayerId),
}

impl SessionEvent {
    /// Participants the transport should notify.
    pub fn recipients(&self) -> Vec<PlayerId> {
        match self {
            Self::MatchStarted(snap) | Self::BoardChanged(snap) => {
                snap.participants.iter().map(|p| p.id).collect()
            }
            Self::MatchEnded(done) => done.participants.iter().map(|p| p.id).collect(),
            Self::RematchOffered { to, .. } => vec![*to],
            Self::RematchRejected { requester, .. } => vec![*requester],
            Self::QueueCancelled(id) => vec![*id],
        }
    }
}
