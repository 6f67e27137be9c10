use super::PersistenceError;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::PathBuf;

/// Trait for types that can be persisted in a JsonStore.
pub trait Storable: Serialize + DeserializeOwned {
    /// File stem the record is stored under.
    fn key(&self) -> String;
}

/// Generic JSON-file-per-record persistence store.
pub struct JsonStore<T> {
    dir: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T: Storable> JsonStore<T> {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _phantom: PhantomData,
        }
    }

    pub fn ensure_dir(&self) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Save a record, replacing any previous version. Returns the key.
    pub fn save(&self, data: &T) -> Result<String, PersistenceError> {
        self.ensure_dir()?;
        let key = data.key();
        let json = serde_json::to_string_pretty(data)?;
        // Write-then-rename so readers never observe a half-written record.
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, self.file_path(&key))?;
        Ok(key)
    }

    /// Load a record by key. Returns None if not found.
    pub fn load(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let data = serde_json::from_str(&contents)?;
        Ok(Some(data))
    }

    /// Load all records from the store directory, skipping files that fail to parse.
    pub fn load_all(&self) -> Result<Vec<T>, PersistenceError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut items = Vec::new();
        let entries = std::fs::read_dir(&self.dir)?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match serde_json::from_str::<T>(&contents) {
                        Ok(data) => items.push(data),
                        Err(e) => tracing::warn!("Skipping unparsable record {:?}: {}", path, e),
                    },
                    Err(e) => {
                        tracing::warn!("Failed to read file {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(items)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize, PersistenceError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                count += 1;
            }
        }
        Ok(count)
    }
}
