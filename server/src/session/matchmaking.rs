//! Single-slot rendezvous for pairing anonymous players.

use othello::{Participant, PlayerId};
use tokio::sync::Mutex;

/// Result of arriving at the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arrival {
    /// The slot was empty; the caller now occupies it.
    Waiting,
    /// The caller was already the occupant; nothing changed.
    AlreadyWaiting,
    /// The occupant was taken out of the slot to play the caller.
    Paired(Participant),
}

/// Capacity-one hand-off. At most one participant ever waits.
#[derive(Debug, Default)]
pub struct RendezvousSlot {
    waiting: Mutex<Option<Participant>>,
}

impl RendezvousSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim-and-clear happens under one lock, so two arrivals can never
    /// both take the same occupant.
    pub async fn arrive(&self, participant: Participant) -> Arrival {
        let mut slot = self.waiting.lock().await;
        match slot.take() {
            None => {
                *slot = Some(participant);
                Arrival::Waiting
            }
            Some(occupant) if occupant.id == participant.id => {
                *slot = Some(occupant);
                Arrival::AlreadyWaiting
            }
            Some(occupant) => Arrival::Paired(occupant),
        }
    }

    /// Leave the slot. No-op unless `player` is the current occupant.
    pub async fn cancel(&self, player: PlayerId) -> bool {
        let mut slot = self.waiting.lock().await;
        if slot.as_ref().is_some_and(|p| p.id == player) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub async fn occupant(&self) -> Option<PlayerId> {
        self.waiting.lock().await.as_ref().map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_wait_then_pair() {
        let slot = RendezvousSlot::new();
        let a = Participant::new(1, "A");
        let b = Participant::new(2, "B");

        assert_eq!(slot.arrive(a.clone()).await, Arrival::Waiting);
        assert_eq!(slot.arrive(a.clone()).await, Arrival::AlreadyWaiting);
        assert_eq!(slot.occupant().await, Some(PlayerId(1)));

        assert_eq!(slot.arrive(b).await, Arrival::Paired(a));
        assert_eq!(slot.occupant().await, None);
    }

    #[tokio::test]
    async fn test_cancel_only_by_occupant() {
        let slot = RendezvousSlot::new();
        slot.arrive(Participant::new(1, "A")).await;

        assert!(!slot.cancel(PlayerId(2)).await);
        assert_eq!(slot.occupant().await, Some(PlayerId(1)));

        assert!(slot.cancel(PlayerId(1)).await);
        assert_eq!(slot.occupant().await, None);
        assert!(!slot.cancel(PlayerId(1)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_arrivals_pair_up_exactly() {
        let slot = Arc::new(RendezvousSlot::new());
        let mut tasks = Vec::new();
        for id in 0..64 {
            let slot = slot.clone();
            tasks.push(tokio::spawn(async move {
                slot.arrive(Participant::new(id, format!("p{}", id))).await
            }));
        }

        let mut paired = 0;
        let mut waiting = 0;
        for task in tasks {
            match task.await.unwrap() {
                Arrival::Paired(_) => paired += 1,
                Arrival::Waiting => waiting += 1,
                Arrival::AlreadyWaiting => unreachable!("ids are distinct"),
            }
        }
        // Every pairing consumes exactly one earlier waiter.
        assert_eq!(paired, 32);
        assert_eq!(waiting, 32);
        assert_eq!(slot.occupant().await, None);
    }
}
