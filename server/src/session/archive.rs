//! Short-lived store of finished matches for replays and rematches.
//!
//! Entries expire after a fixed lifetime. A missing entry is the normal
//! "too old" case, never an error in the registry itself.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use othello::{MatchId, Side};
use tokio::time::Instant;

use super::error::SessionError;
use super::snapshot::FinishedMatch;

const REPLAY_PREFIX: &str = "replay";

#[derive(Debug)]
pub struct OutcomeArchive {
    ttl: Duration,
    entries: HashMap<MatchId, (Instant, FinishedMatch)>,
}

impl OutcomeArchive {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, finished: FinishedMatch) {
        self.entries
            .insert(finished.match_id.clone(), (Instant::now(), finished));
    }

    /// Expired entries are dropped on access.
    pub fn get(&mut self, id: &MatchId) -> Option<&FinishedMatch> {
        let expired = self
            .entries
            .get(id)
            .is_some_and(|(at, _)| at.elapsed() >= self.ttl);
        if expired {
            self.entries.remove(id);
            return None;
        }
        self.entries.get(id).map(|(_, finished)| finished)
    }

    pub fn contains(&mut self, id: &MatchId) -> bool {
        self.get(id).is_some()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, (at, _)| at.elapsed() < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed `replay<w|b><match id>` token.
///
/// `w` means the first (light) side opened the match, `b` the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    pub starting_side: Side,
    pub match_id: MatchId,
}

impl fmt::Display for ReplayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = match self.starting_side {
            Side::First => 'w',
            Side::Second => 'b',
        };
        write!(f, "{}{}{}", REPLAY_PREFIX, flag, self.match_id)
    }
}

impl FromStr for ReplayRequest {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SessionError::InvalidReplayToken(s.to_string());
        let rest = s.strip_prefix(REPLAY_PREFIX).ok_or_else(malformed)?;
        let mut chars = rest.chars();
        let starting_side = match chars.next() {
            Some('w') => Side::First,
            Some('b') => Side::Second,
            _ => return Err(malformed()),
        };
        let id = chars.as_str();
        if id.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            starting_side,
            match_id: MatchId::new(id),
        })
    }
}
