//! Async repository trait for the player persistence collaborator.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` when the session manager is driven from
//! `tokio::spawn`ed request tasks.

use super::{PersistenceError, PlayerRecord};
use othello::PlayerId;
use std::future::Future;

/// Durable player records: result counters and the legal-move display preference.
pub trait PlayerRepository: Send + Sync {
    /// Create the record if missing. Returns `true` when it was newly created.
    fn add_player(
        &self,
        id: PlayerId,
        name: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn find(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<Option<PlayerRecord>, PersistenceError>> + Send;
    fn list_players(
        &self,
    ) -> impl Future<Output = Result<Vec<PlayerRecord>, PersistenceError>> + Send;
    fn increment_wins(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn increment_losses(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn increment_draws(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Unknown players fall back to showing legal moves.
    fn legal_moves_shown(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    /// Flip the preference and return the new value.
    fn toggle_legal_moves(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn count_players(&self) -> impl Future<Output = Result<usize, PersistenceError>> + Send;
}
