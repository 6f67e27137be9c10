use std::collections::HashMap;

use othello::{Match, MatchId, PlayerId};

use super::error::{invariant_violated, SessionError};

/// Running matches and who plays in them.
///
/// Guarded by one lock in the session manager; holding it is what makes a
/// [`Match`] single-writer.
#[derive(Debug, Default)]
pub struct ActiveMatches {
    by_player: HashMap<PlayerId, MatchId>,
    matches: HashMap<MatchId, Match>,
}

impl ActiveMatches {
    pub fn is_playing(&self, player: PlayerId) -> bool {
        self.by_player.contains_key(&player)
    }

    pub fn match_id_of(&self, player: PlayerId) -> Option<&MatchId> {
        self.by_player.get(&player)
    }

    /// The running match of `player`.
    ///
    /// No entry is a stale session; an entry pointing nowhere is a broken index.
    pub fn match_of(&mut self, player: PlayerId) -> Result<&mut Match, SessionError> {
        let id = self
            .by_player
            .get(&player)
            .ok_or(SessionError::NoActiveMatch)?;
        match self.matches.get_mut(id) {
            Some(game) => Ok(game),
            None => invariant_violated(format_args!(
                "player {} is indexed to missing match {}",
                player, id
            )),
        }
    }

    pub fn get(&self, id: &MatchId) -> Option<&Match> {
        self.matches.get(id)
    }

    pub fn insert(&mut self, game: Match) {
        let id = game.id().clone();
        for p in game.participants() {
            if let Some(existing) = self.by_player.insert(p.id, id.clone()) {
                invariant_violated(format_args!(
                    "player {} already plays {} when {} starts",
                    p.id, existing, id
                ));
            }
        }
        self.matches.insert(id, game);
    }

    pub fn remove(&mut self, id: &MatchId) -> Option<Match> {
        let game = self.matches.remove(id)?;
        for p in game.participants() {
            self.by_player.remove(&p.id);
        }
        Some(game)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
