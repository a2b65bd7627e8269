//! Persistent key-value storage backing the credential store
//!
//! Every operation goes straight to the backing medium; implementations keep
//! no cache that could diverge from what a fresh process would read.

use super::types::{AuthError, AuthResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// String-valued key-value storage
///
/// `set_many` and `remove_many` apply all their entries in one step: a reader
/// never observes some of the entries applied and others not.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Remove `key` and return its previous value in one step.
    ///
    /// Of several concurrent callers at most one receives the value.
    async fn take(&self, key: &str) -> AuthResult<Option<String>>;

    async fn set_many(&self, entries: &[(&str, &str)]) -> AuthResult<()>;

    async fn remove_many(&self, keys: &[&str]) -> AuthResult<()>;

    async fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        self.set_many(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> AuthResult<()> {
        self.remove_many(&[key]).await
    }
}

/// In-process storage, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AuthResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AuthError::Storage("memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn take(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.lock()?.remove(key))
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> AuthResult<()> {
        let mut map = self.lock()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> AuthResult<()> {
        let mut map = self.lock()?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON file storage that survives process restarts
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStorage {
    /// Default file name inside the data directory
    pub const FILE_NAME: &'static str = "session.json";

    /// Storage at an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Storage inside `dir`, using the default file name
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    /// Storage inside the platform data directory
    pub fn default_location() -> AuthResult<Self> {
        let dir = tollgate_common::data_dir().map_err(|e| AuthError::Config(e.to_string()))?;
        Ok(Self::in_dir(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> AuthResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AuthError::Io(e)),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Persisted session state to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn take(&self, key: &str) -> AuthResult<Option<String>> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        let value = map.remove(key);
        if value.is_some() {
            self.write_map(&map).await?;
        }
        Ok(value)
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> AuthResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map).await
    }

    async fn remove_many(&self, keys: &[&str]) -> AuthResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before {
            return Ok(());
        }
        self.write_map(&map).await
    }
}
