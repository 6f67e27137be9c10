use std::collections::HashMap;

use othello::{MatchId, Participant};

/// Transport invite tokens: who proposed each open invite, and which token a
/// running match is displayed under.
#[derive(Debug, Default)]
pub struct InviteIndex {
    pending: HashMap<String, Participant>,
    linked: HashMap<MatchId, String>,
}

impl InviteIndex {
    pub fn open(&mut self, token: String, proposer: Participant) {
        self.pending.insert(token, proposer);
    }

    pub fn proposer(&self, token: &str) -> Option<&Participant> {
        self.pending.get(token)
    }

    pub fn take(&mut self, token: &str) -> Option<Participant> {
        self.pending.remove(token)
    }

    pub fn link(&mut self, match_id: MatchId, token: String) {
        self.linked.insert(match_id, token);
    }

    /// Point the match at a new token. Returns the token it replaced.
    pub fn relink(&mut self, match_id: &MatchId, token: String) -> Option<String> {
        self.linked.insert(match_id.clone(), token)
    }

    pub fn unlink(&mut self, match_id: &MatchId) -> Option<String> {
        self.linked.remove(match_id)
    }

    pub fn token_of(&self, match_id: &MatchId) -> Option<&str> {
        self.linked.get(match_id).map(String::as_str)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
