use super::JsonStore;
use super::{PersistenceError, PlayerRecord};
use othello::PlayerId;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Player records as one JSON file each under `<data_dir>/players`.
///
/// File access runs on tokio's blocking pool, never on an async worker.
pub struct PlayerStore {
    records: Arc<Records>,
}

struct Records {
    inner: JsonStore<PlayerRecord>,
    // Serializes read-modify-write cycles on the files.
    write_lock: Mutex<()>,
}

impl Records {
    fn key(id: PlayerId) -> String {
        format!("player_{}", id)
    }

    fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, PersistenceError> {
        self.inner.load(&Self::key(id))
    }

    /// Returns `true` when the record did not exist yet.
    fn add(&self, id: PlayerId, name: &str) -> Result<bool, PersistenceError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.load(id)?.is_some() {
            return Ok(false);
        }
        self.inner.save(&PlayerRecord::new(id, name))?;
        Ok(true)
    }

    /// All players, oldest first.
    fn list(&self) -> Result<Vec<PlayerRecord>, PersistenceError> {
        let mut players = self.inner.load_all()?;
        players.sort_by_key(|p| (p.created_at, p.player_id));
        Ok(players)
    }

    /// Apply `f` to a stored record and write it back.
    fn update<T>(
        &self,
        id: PlayerId,
        f: impl FnOnce(&mut PlayerRecord) -> T,
    ) -> Result<T, PersistenceError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut record = self
            .load(id)?
            .ok_or(PersistenceError::PlayerNotFound(id))?;
        let out = f(&mut record);
        self.inner.save(&record)?;
        Ok(out)
    }
}

impl PlayerStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            records: Arc::new(Records {
                inner: JsonStore::new(data_dir.join("players")),
                write_lock: Mutex::new(()),
            }),
        }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&Records) -> Result<T, PersistenceError> + Send + 'static,
    {
        let records = Arc::clone(&self.records);
        tokio::task::spawn_blocking(move || f(&records)).await?
    }
}

impl super::traits::PlayerRepository for PlayerStore {
    async fn add_player(&self, id: PlayerId, name: &str) -> Result<bool, PersistenceError> {
        let name = name.to_string();
        self.run(move |r| r.add(id, &name)).await
    }

    async fn find(&self, id: PlayerId) -> Result<Option<PlayerRecord>, PersistenceError> {
        self.run(move |r| r.load(id)).await
    }

    async fn list_players(&self) -> Result<Vec<PlayerRecord>, PersistenceError> {
        self.run(|r| r.list()).await
    }

    async fn increment_wins(&self, id: PlayerId) -> Result<(), PersistenceError> {
        self.run(move |r| r.update(id, |rec| rec.wins += 1)).await
    }

    async fn increment_losses(&self, id: PlayerId) -> Result<(), PersistenceError> {
        self.run(move |r| r.update(id, |rec| rec.losses += 1)).await
    }

    async fn increment_draws(&self, id: PlayerId) -> Result<(), PersistenceError> {
        self.run(move |r| r.update(id, |rec| rec.draws += 1)).await
    }

    async fn legal_moves_shown(&self, id: PlayerId) -> Result<bool, PersistenceError> {
        self.run(move |r| Ok(r.load(id)?.map_or(true, |rec| rec.legal_moves_shown)))
            .await
    }

    async fn toggle_legal_moves(&self, id: PlayerId) -> Result<bool, PersistenceError> {
        self.run(move |r| {
            r.update(id, |rec| {
                rec.legal_moves_shown = !rec.legal_moves_shown;
                rec.legal_moves_shown
            })
        })
        .await
    }

    async fn count_players(&self) -> Result<usize, PersistenceError> {
        self.run(|r| r.inner.count()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::PlayerRepository;

    #[tokio::test]
    async fn test_add_player_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlayerStore::new(dir.path().to_path_buf());

        assert!(store.add_player(PlayerId(1), "Alice").await.unwrap());
        assert!(!store.add_player(PlayerId(1), "Alice again").await.unwrap());
        assert_eq!(store.count_players().await.unwrap(), 1);

        let record = store.find(PlayerId(1)).await.unwrap().unwrap();
        assert_eq!(record.name, "Alice");
        assert!(record.legal_moves_shown);
    }

    #[tokio::test]
    async fn test_counters_and_toggle_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlayerStore::new(dir.path().to_path_buf());
        store.add_player(PlayerId(7), "Bob").await.unwrap();

        store.increment_wins(PlayerId(7)).await.unwrap();
        store.increment_wins(PlayerId(7)).await.unwrap();
        store.increment_losses(PlayerId(7)).await.unwrap();
        store.increment_draws(PlayerId(7)).await.unwrap();
        assert!(!store.toggle_legal_moves(PlayerId(7)).await.unwrap());

        // A fresh store over the same directory sees the same data.
        let reopened = PlayerStore::new(dir.path().to_path_buf());
        let record = reopened.find(PlayerId(7)).await.unwrap().unwrap();
        assert_eq!((record.wins, record.losses, record.draws), (2, 1, 1));
        assert!(!reopened.legal_moves_shown(PlayerId(7)).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(PlayerStore::new(dir.path().to_path_buf()));
        store.add_player(PlayerId(3), "Carol").await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.increment_wins(PlayerId(3)).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let record = store.find(PlayerId(3)).await.unwrap().unwrap();
        assert_eq!(record.wins, 16);
    }

    #[tokio::test]
    async fn test_unknown_player() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlayerStore::new(dir.path().to_path_buf());

        assert!(store.find(PlayerId(99)).await.unwrap().is_none());
        assert!(store.legal_moves_shown(PlayerId(99)).await.unwrap());
        assert!(matches!(
            store.increment_wins(PlayerId(99)).await,
            Err(PersistenceError::PlayerNotFound(PlayerId(99)))
        ));
        assert!(store.list_players().await.unwrap().is_empty());
    }
}
