pub mod archive;
pub mod error;
pub mod events;
pub mod invites;
pub mod matchmaking;
pub mod registry;
pub mod rematch;
pub mod snapshot;

use std::collections::HashMap;
use std::time::Duration;

use othello::{Board, Coord, Match, MatchId, Participant, PlayerId, PlyOutcome};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config;
use crate::persistence::{PersistenceError, PlayerRepository};
use crate::scoreboard::{ScoreRecord, Scoreboard, ScoreboardError, Standing};
use crate::stats::{DailyStats, StatsSnapshot};
pub use archive::{OutcomeArchive, ReplayRequest};
pub(crate) use error::invariant_violated;
pub use error::SessionError;
pub use events::SessionEvent;
use invites::InviteIndex;
pub use matchmaking::{Arrival, RendezvousSlot};
use registry::ActiveMatches;
use rematch::{Handshake, RematchOffers};
pub use rematch::RematchOffer;
pub use snapshot::{EndReason, FinishedMatch, MatchSnapshot};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long the side to move may idle before the other side can end the match.
    pub inactivity_threshold: Duration,
    /// How long finished matches stay available for replays and rematches.
    pub replay_ttl: Duration,
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold: Duration::from_secs(config::DEFAULT_INACTIVITY_SECS),
            replay_ttl: Duration::from_secs(config::DEFAULT_REPLAY_TTL_SECS),
            event_capacity: config::DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOutcome {
    Waiting,
    /// The caller was already waiting; wait on.
    AlreadyWaiting,
    Paired(MatchSnapshot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RematchOutcome {
    /// Stored until the opponent answers.
    Offered,
    Started(MatchSnapshot),
}

/// Result of a successful move.
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub ply: PlyOutcome,
    pub snapshot: MatchSnapshot,
    /// Set when the move ended the match.
    pub finished: Option<FinishedMatch>,
}

#[derive(Debug, Clone)]
pub struct ReplayView {
    pub finished: FinishedMatch,
    pub frames: Vec<Board>,
}

#[derive(Debug, Clone, Copy)]
enum Tally {
    Win,
    Loss,
    Draw,
}

/// Owns every running match and the indices around it.
///
/// Each index has its own lock. When more than one is held they are taken in
/// this order: active, last-active, invites, rematches, archive, scoreboard.
/// The random-queue slot is never held together with another lock.
pub struct SessionManager<R> {
    config: SessionConfig,
    players: R,
    active: Mutex<ActiveMatches>,
    last_active: Mutex<HashMap<PlayerId, Instant>>,
    invites: Mutex<InviteIndex>,
    rematches: Mutex<RematchOffers>,
    archive: Mutex<OutcomeArchive>,
    scoreboard: RwLock<Scoreboard>,
    queue: RendezvousSlot,
    stats: DailyStats,
    rng: std::sync::Mutex<StdRng>,
    events: broadcast::Sender<SessionEvent>,
}

impl<R: PlayerRepository> SessionManager<R> {
    pub fn new(players: R, config: SessionConfig) -> Self {
        Self::with_rng(players, config, StdRng::from_entropy())
    }

    /// Starting sides are drawn from `rng`; seed it to make them reproducible.
    pub fn with_rng(players: R, config: SessionConfig, rng: StdRng) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            archive: Mutex::new(OutcomeArchive::new(config.replay_ttl)),
            config,
            players,
            active: Mutex::new(ActiveMatches::default()),
            last_active: Mutex::new(HashMap::new()),
            invites: Mutex::new(InviteIndex::default()),
            rematches: Mutex::new(RematchOffers::default()),
            scoreboard: RwLock::new(Scoreboard::new()),
            queue: RendezvousSlot::new(),
            stats: DailyStats::default(),
            rng: std::sync::Mutex::new(rng),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn players(&self) -> &R {
        &self.players
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Put every stored player on the scoreboard. Returns how many were loaded.
    pub async fn load_scoreboard(&self) -> Result<usize, SessionError> {
        let records = self.players.list_players().await?;
        let mut scoreboard = self.scoreboard.write().await;
        for record in &records {
            scoreboard.insert(ScoreRecord::from(record));
        }
        Ok(records.len())
    }

    /// First-contact registration. Returns `true` for a new player.
    pub async fn register_player(&self, player: &Participant) -> Result<bool, SessionError> {
        let created = self.players.add_player(player.id, &player.name).await?;
        if created {
            self.stats.player_joined();
            tracing::info!(player = %player.id, "Registered {}", player.name);
        }

        let listed = self.scoreboard.read().await.contains(player.id);
        if created || !listed {
            let record = self
                .players
                .find(player.id)
                .await?
                .ok_or(PersistenceError::PlayerNotFound(player.id))?;
            self.scoreboard
                .write()
                .await
                .insert(ScoreRecord::from(&record));
        }
        Ok(created)
    }

    // --- Pairing ---

    /// Open an invite that the next responder with `token` will accept.
    pub async fn create_invite(
        &self,
        token: impl Into<String>,
        proposer: Participant,
    ) -> Result<(), SessionError> {
        self.register_player(&proposer).await?;
        let active = self.active.lock().await;
        if active.is_playing(proposer.id) {
            return Err(SessionError::AlreadyPlaying {
                name: proposer.name,
            });
        }
        let token = token.into();
        tracing::debug!(player = %proposer.id, token = %token, "Invite opened");
        self.invites.lock().await.open(token, proposer);
        Ok(())
    }

    pub async fn pair_with_friend(
        &self,
        token: &str,
        responder: Participant,
    ) -> Result<MatchSnapshot, SessionError> {
        self.register_player(&responder).await?;
        let snapshot = {
            let mut active = self.active.lock().await;
            let mut last_active = self.last_active.lock().await;
            let mut invites = self.invites.lock().await;

            let proposer = invites
                .proposer(token)
                .cloned()
                .ok_or(SessionError::InviteExpired)?;
            let snapshot = self.begin_match(&mut active, &mut last_active, proposer, responder)?;
            invites.take(token);
            invites.link(snapshot.match_id.clone(), token.to_string());
            snapshot
        };
        Ok(self.announce_start(snapshot).await)
    }

    /// The transport re-posted the caller's match under `token`.
    /// Returns the token the match was shown under before.
    pub async fn relink_invite(
        &self,
        player: PlayerId,
        token: impl Into<String>,
    ) -> Result<Option<String>, SessionError> {
        let active = self.active.lock().await;
        let match_id = active
            .match_id_of(player)
            .cloned()
            .ok_or(SessionError::NoActiveMatch)?;
        let previous = self.invites.lock().await.relink(&match_id, token.into());
        tracing::debug!(match_id = %match_id, ?previous, "Match moved to a new message");
        Ok(previous)
    }

    pub async fn join_random_queue(
        &self,
        participant: Participant,
    ) -> Result<QueueOutcome, SessionError> {
        self.register_player(&participant).await?;
        let playing = self.active.lock().await.is_playing(participant.id);
        if playing {
            return Err(SessionError::AlreadyPlaying {
                name: participant.name,
            });
        }

        loop {
            match self.queue.arrive(participant.clone()).await {
                Arrival::Waiting => {
                    tracing::debug!(player = %participant.id, "Waiting for a random opponent");
                    return Ok(QueueOutcome::Waiting);
                }
                Arrival::AlreadyWaiting => return Ok(QueueOutcome::AlreadyWaiting),
                Arrival::Paired(waiting) => {
                    let waiting_id = waiting.id;
                    match self.start_match(waiting, participant.clone()).await {
                        Ok(snapshot) => return Ok(QueueOutcome::Paired(snapshot)),
                        Err(SessionError::AlreadyPlaying { name }) => {
                            if self.is_playing(participant.id).await {
                                return Err(SessionError::AlreadyPlaying { name });
                            }
                            // The occupant started a match elsewhere and has
                            // already left the slot; try the slot again.
                            tracing::debug!(player = %waiting_id, "Dropped stale queue occupant");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    /// Leave the random queue. Returns `false` if someone else holds the slot.
    pub async fn cancel_queue(&self, player: PlayerId) -> bool {
        let cancelled = self.queue.cancel(player).await;
        if cancelled {
            tracing::debug!(player = %player, "Left the random queue");
            self.emit(SessionEvent::QueueCancelled(player));
        }
        cancelled
    }

    pub async fn queue_occupant(&self) -> Option<PlayerId> {
        self.queue.occupant().await
    }

    async fn start_match(
        &self,
        first: Participant,
        second: Participant,
    ) -> Result<MatchSnapshot, SessionError> {
        let snapshot = {
            let mut active = self.active.lock().await;
            let mut last_active = self.last_active.lock().await;
            self.begin_match(&mut active, &mut last_active, first, second)?
        };
        Ok(self.announce_start(snapshot).await)
    }

    fn begin_match(
        &self,
        active: &mut ActiveMatches,
        last_active: &mut HashMap<PlayerId, Instant>,
        first: Participant,
        second: Participant,
    ) -> Result<MatchSnapshot, SessionError> {
        if first.id == second.id {
            return Err(SessionError::SelfPairing);
        }
        for p in [&first, &second] {
            if active.is_playing(p.id) {
                return Err(SessionError::AlreadyPlaying {
                    name: p.name.clone(),
                });
            }
        }

        let id = MatchId::new(Uuid::new_v4().to_string());
        let game = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            Match::new(id, first, second, &mut *rng)
        };

        let now = Instant::now();
        for p in game.participants() {
            last_active.insert(p.id, now);
        }
        tracing::info!(match_id = %game.id(), "Started {}", game);

        let snapshot = MatchSnapshot::of(&game);
        active.insert(game);
        Ok(snapshot)
    }

    /// Runs with no index lock held.
    async fn announce_start(&self, snapshot: MatchSnapshot) -> MatchSnapshot {
        // Someone waiting in the random queue may have started this match
        // through an invite or a rematch.
        for p in &snapshot.participants {
            self.queue.cancel(p.id).await;
        }
        let snapshot = self.reveal(snapshot).await;
        self.emit(SessionEvent::MatchStarted(snapshot.clone()));
        snapshot
    }

    /// Hide legal targets unless the participant to move wants to see them.
    async fn reveal(&self, mut snapshot: MatchSnapshot) -> MatchSnapshot {
        let viewer = snapshot.active_participant().id;
        let shown = match self.players.legal_moves_shown(viewer).await {
            Ok(shown) => shown,
            Err(e) => {
                tracing::warn!(player = %viewer, "Failed to read legal-move preference: {}", e);
                true
            }
        };
        if !shown {
            snapshot.legal_targets = None;
        }
        snapshot
    }

    // --- Playing ---

    pub async fn place_move(&self, player: PlayerId, at: Coord) -> Result<MoveReport, SessionError> {
        let mut active = self.active.lock().await;
        let game = active.match_of(player)?;
        let ply = game.place_disk(at, player)?;

        let match_id = game.id().clone();
        let snapshot = MatchSnapshot::of(game);
        let winner = game.winner().map(|side| game.participant(side).id);
        // The side to act next gets a fresh inactivity clock. After a pass
        // that is the mover again.
        let next = game.active_participant().id;
        self.last_active.lock().await.insert(next, Instant::now());

        if ply.ended {
            let finished = self
                .finish(&mut active, &match_id, EndReason::Completed, winner)
                .await;
            return Ok(MoveReport {
                ply,
                snapshot,
                finished: Some(finished),
            });
        }
        drop(active);

        let snapshot = self.reveal(snapshot).await;
        self.emit(SessionEvent::BoardChanged(snapshot.clone()));
        Ok(MoveReport {
            ply,
            snapshot,
            finished: None,
        })
    }

    /// End the match because the opponent has not moved for too long.
    pub async fn force_end_on_inactivity(
        &self,
        requester: PlayerId,
    ) -> Result<FinishedMatch, SessionError> {
        let mut active = self.active.lock().await;
        let game = active.match_of(requester)?;
        if game.is_turn_of(requester) {
            return Err(SessionError::CannotEndOnOwnTurn);
        }
        let match_id = game.id().clone();
        let opponent = game.active_participant().id;

        let idle = match self.last_active.lock().await.get(&opponent) {
            Some(at) => at.elapsed(),
            None => invariant_violated(format_args!(
                "{} plays {} but has no activity timestamp",
                opponent, match_id
            )),
        };
        let threshold = self.config.inactivity_threshold;
        if idle <= threshold {
            return Err(SessionError::OpponentStillActive {
                remaining_secs: threshold.as_secs().saturating_sub(idle.as_secs()),
            });
        }

        tracing::info!(
            match_id = %match_id,
            player = %requester,
            idle_secs = idle.as_secs(),
            "Ending match for inactivity"
        );
        Ok(self
            .finish(&mut active, &match_id, EndReason::Inactivity, Some(requester))
            .await)
    }

    pub async fn surrender(&self, player: PlayerId) -> Result<FinishedMatch, SessionError> {
        let mut active = self.active.lock().await;
        let game = active.match_of(player)?;
        let match_id = game.id().clone();
        let winner = match game.opponent_of(player) {
            Some(p) => p.id,
            None => invariant_violated(format_args!("{} surrendered {} without a seat", player, match_id)),
        };
        tracing::info!(match_id = %match_id, player = %player, "Surrendered");
        Ok(self
            .finish(&mut active, &match_id, EndReason::Surrendered, Some(winner))
            .await)
    }

    /// Record the outcome, then release both participants.
    ///
    /// Runs with the active-match lock held, so nobody observes a match that
    /// is over but still indexed.
    async fn finish(
        &self,
        active: &mut ActiveMatches,
        match_id: &MatchId,
        reason: EndReason,
        winner: Option<PlayerId>,
    ) -> FinishedMatch {
        let span = tracing::info_span!("match", id = %match_id);
        async move {
            let finished = match active.get(match_id) {
                Some(game) => FinishedMatch::of(game, reason, winner),
                None => invariant_violated(format_args!("finishing unknown match {}", match_id)),
            };

            self.archive.lock().await.insert(finished.clone());
            self.record_result(&finished).await;

            active.remove(match_id);
            {
                let mut last_active = self.last_active.lock().await;
                for p in &finished.participants {
                    last_active.remove(&p.id);
                }
            }
            self.invites.lock().await.unlink(match_id);

            self.stats.game_played();
            tracing::info!(reason = ?finished.reason, winner = ?finished.winner, "Match ended");
            self.emit(SessionEvent::MatchEnded(finished.clone()));
            finished
        }
        .instrument(span)
        .await
    }

    /// Persist and rank the result. Storage failures are logged; the match
    /// still ends so nobody stays stuck in it.
    async fn record_result(&self, finished: &FinishedMatch) {
        let tallies: Vec<(PlayerId, Tally)> = match (finished.winner, finished.loser()) {
            (Some(winner), Some(loser)) => vec![(winner, Tally::Win), (loser, Tally::Loss)],
            _ => finished
                .participants
                .iter()
                .map(|p| (p.id, Tally::Draw))
                .collect(),
        };

        for &(player, tally) in &tallies {
            let stored = match tally {
                Tally::Win => self.players.increment_wins(player).await,
                Tally::Loss => self.players.increment_losses(player).await,
                Tally::Draw => self.players.increment_draws(player).await,
            };
            if let Err(e) = stored {
                tracing::error!(player = %player, ?tally, "Failed to store result: {}", e);
            }
        }

        let mut scoreboard = self.scoreboard.write().await;
        for &(player, tally) in &tallies {
            let ranked = match tally {
                Tally::Win => scoreboard.apply_delta(player, 1, 0),
                Tally::Loss => scoreboard.apply_delta(player, 0, 1),
                Tally::Draw => scoreboard.record_draw(player),
            };
            if let Err(ScoreboardError::UnknownPlayer(id)) = ranked {
                invariant_violated(format_args!("{} finished a match but is not ranked", id));
            }
        }
    }

    // --- Rematches ---

    pub async fn request_rematch(
        &self,
        requester: PlayerId,
        opponent: PlayerId,
        ended: &MatchId,
    ) -> Result<RematchOutcome, SessionError> {
        let offer = {
            let mut archive = self.archive.lock().await;
            let finished = archive
                .get(ended)
                .ok_or_else(|| SessionError::UnknownMatch(ended.clone()))?;
            let me = finished.participants.iter().find(|p| p.id == requester);
            match (me, finished.opponent_of(requester)) {
                (Some(me), Some(them)) if them.id == opponent => RematchOffer {
                    match_id: ended.clone(),
                    requester: me.clone(),
                    opponent: them.clone(),
                },
                _ => return Err(SessionError::NotAParticipant),
            }
        };

        let handshake = self.rematches.lock().await.file(offer.clone());
        match handshake {
            Handshake::Offered => {
                tracing::debug!(match_id = %ended, player = %requester, "Rematch offered");
                self.emit(SessionEvent::RematchOffered {
                    from: offer.requester,
                    to: opponent,
                    match_id: offer.match_id,
                });
                Ok(RematchOutcome::Offered)
            }
            Handshake::Agreed => {
                tracing::info!(match_id = %ended, "Both sides asked for a rematch");
                let snapshot = self.start_match(offer.requester, offer.opponent).await?;
                Ok(RematchOutcome::Started(snapshot))
            }
        }
    }

    pub async fn accept_rematch(
        &self,
        answerer: PlayerId,
        requester: PlayerId,
    ) -> Result<MatchSnapshot, SessionError> {
        let offer = self
            .rematches
            .lock()
            .await
            .take_addressed_to(requester, answerer)
            .ok_or(SessionError::RematchOfferMissing)?;
        tracing::info!(match_id = %offer.match_id, "Rematch accepted");
        self.start_match(offer.opponent, offer.requester).await
    }

    pub async fn reject_rematch(
        &self,
        answerer: PlayerId,
        requester: PlayerId,
    ) -> Result<RematchOffer, SessionError> {
        let offer = self
            .rematches
            .lock()
            .await
            .take_addressed_to(requester, answerer)
            .ok_or(SessionError::RematchOfferMissing)?;
        self.emit(SessionEvent::RematchRejected {
            requester,
            by: offer.opponent.clone(),
        });
        Ok(offer)
    }

    // --- Queries ---

    pub async fn is_playing(&self, player: PlayerId) -> bool {
        self.active.lock().await.is_playing(player)
    }

    pub async fn current_match(&self, player: PlayerId) -> Result<MatchSnapshot, SessionError> {
        let snapshot = {
            let mut active = self.active.lock().await;
            MatchSnapshot::of(active.match_of(player)?)
        };
        Ok(self.reveal(snapshot).await)
    }

    pub async fn opponent_of(&self, player: PlayerId) -> Result<Participant, SessionError> {
        let mut active = self.active.lock().await;
        let game = active.match_of(player)?;
        match game.opponent_of(player) {
            Some(p) => Ok(p.clone()),
            None => invariant_violated(format_args!("{} indexed to {} without a seat", player, game.id())),
        }
    }

    /// Flip the caller's legal-move hints. Only allowed during a match.
    pub async fn toggle_legal_moves(&self, player: PlayerId) -> Result<bool, SessionError> {
        if !self.is_playing(player).await {
            return Err(SessionError::NoActiveMatch);
        }
        let shown = self.players.toggle_legal_moves(player).await?;

        // Redraw only if the hints belong to the player to move.
        let redraw = {
            let mut active = self.active.lock().await;
            match active.match_of(player) {
                Ok(game) if game.is_turn_of(player) => Some(MatchSnapshot::of(game)),
                _ => None,
            }
        };
        if let Some(snapshot) = redraw {
            let snapshot = self.reveal(snapshot).await;
            self.emit(SessionEvent::BoardChanged(snapshot));
        }
        Ok(shown)
    }

    /// Look up an archived match by its replay token.
    pub async fn resolve_replay(&self, token: &str) -> Result<ReplayView, SessionError> {
        let request: ReplayRequest = token.parse()?;
        let finished = self
            .archive
            .lock()
            .await
            .get(&request.match_id)
            .cloned()
            .ok_or(SessionError::ReplayExpired)?;
        if finished.starting_side != request.starting_side {
            return Err(SessionError::ReplayExpired);
        }
        let frames = match finished.frames() {
            Ok(frames) => frames,
            Err(e) => invariant_violated(format_args!(
                "archived history of {} does not replay: {}",
                finished.match_id, e
            )),
        };
        Ok(ReplayView { finished, frames })
    }

    pub async fn rank_of(&self, player: PlayerId) -> Result<usize, ScoreboardError> {
        self.scoreboard.read().await.rank_of(player)
    }

    pub async fn profile(&self, player: PlayerId) -> Result<String, SessionError> {
        let record = self
            .players
            .find(player)
            .await?
            .ok_or(PersistenceError::PlayerNotFound(player))?;
        let rank = match self.rank_of(player).await {
            Ok(rank) => rank,
            Err(e) => invariant_violated(format_args!("stored player is unranked: {}", e)),
        };
        Ok(record.profile(rank))
    }

    pub async fn scoreboard_view(&self, viewer: Option<PlayerId>) -> Vec<Standing> {
        self.scoreboard.read().await.view(viewer)
    }

    pub async fn scoreboard_text(&self, viewer: Option<PlayerId>) -> String {
        self.scoreboard.read().await.render(viewer)
    }

    pub async fn stats(&self) -> Result<StatsSnapshot, SessionError> {
        let total = self.players.count_players().await?;
        Ok(self.stats.snapshot(total))
    }

    // --- Maintenance ---

    /// Drop expired archive entries and the rematch offers that pointed at them.
    pub async fn prune_expired(&self) -> usize {
        let mut rematches = self.rematches.lock().await;
        let mut archive = self.archive.lock().await;
        let pruned = archive.prune();
        let before = rematches.len();
        rematches.retain(|offer| archive.contains(&offer.match_id));
        if pruned > 0 || rematches.len() < before {
            tracing::debug!(
                pruned,
                offers_dropped = before - rematches.len(),
                "Pruned expired matches"
            );
        }
        pruned
    }

    /// Start a new statistics day.
    pub fn roll_over_stats(&self) {
        let (games, joined) = self.stats.roll_over();
        tracing::info!(games, joined, "Daily statistics reset");
    }
}
