use std::collections::HashMap;

use othello::{MatchId, Participant, PlayerId};

/// A pending request to replay `match_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RematchOffer {
    pub match_id: MatchId,
    pub requester: Participant,
    pub opponent: Participant,
}

/// What filing an offer led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// Stored; the opponent has to answer.
    Offered,
    /// The opponent had already asked for the same match. Both offers are gone.
    Agreed,
}

/// Pending offers, one per requester. Matching is by ended match id, so an
/// offer for an older match never pairs with one for a newer match.
#[derive(Debug, Default)]
pub struct RematchOffers {
    by_requester: HashMap<PlayerId, RematchOffer>,
}

impl RematchOffers {
    pub fn file(&mut self, offer: RematchOffer) -> Handshake {
        let requester = offer.requester.id;
        let opponent = offer.opponent.id;
        let mirrored = self
            .by_requester
            .get(&opponent)
            .is_some_and(|o| o.match_id == offer.match_id && o.opponent.id == requester);

        if mirrored {
            self.by_requester.remove(&opponent);
            self.by_requester.remove(&requester);
            Handshake::Agreed
        } else {
            self.by_requester.insert(requester, offer);
            Handshake::Offered
        }
    }

    pub fn get(&self, requester: PlayerId) -> Option<&RematchOffer> {
        self.by_requester.get(&requester)
    }

    /// Remove the offer `requester` made to `answerer`, if there is one.
    pub fn take_addressed_to(
        &mut self,
        requester: PlayerId,
        answerer: PlayerId,
    ) -> Option<RematchOffer> {
        if self.get(requester)?.opponent.id != answerer {
            return None;
        }
        self.by_requester.remove(&requester)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&RematchOffer) -> bool) {
        self.by_requester.retain(|_, offer| keep(offer));
    }

    pub fn len(&self) -> usize {
        self.by_requester.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_requester.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(from: i64, to: i64, m: &str) -> RematchOffer {
        RematchOffer {
            match_id: MatchId::new(m),
            requester: Participant::new(from, "from"),
            opponent: Participant::new(to, "to"),
        }
    }

    #[test]
    fn test_mirrored_offer_agrees() {
        let mut offers = RematchOffers::default();
        assert_eq!(offers.file(offer(1, 2, "m")), Handshake::Offered);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers.file(offer(2, 1, "m")), Handshake::Agreed);
        assert!(offers.is_empty());
    }

    #[test]
    fn test_different_match_does_not_cross_pair() {
        let mut offers = RematchOffers::default();
        offers.file(offer(1, 2, "old"));
        assert_eq!(offers.file(offer(2, 1, "new")), Handshake::Offered);
        assert_eq!(offers.len(), 2);
    }

    #[test]
    fn test_take_checks_addressee() {
        let mut offers = RematchOffers::default();
        offers.file(offer(1, 2, "m"));
        assert!(offers.take_addressed_to(PlayerId(1), PlayerId(3)).is_none());
        assert!(offers.take_addressed_to(PlayerId(1), PlayerId(2)).is_some());
        assert!(offers.take_addressed_to(PlayerId(1), PlayerId(2)).is_none());
    }
}
