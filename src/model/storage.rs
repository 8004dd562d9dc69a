//! Key-value persistence for favorites, queue, downloads and theme

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Namespaced keys the player reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Favorites,
    Queue,
    Downloads,
    Theme,
}

impl StorageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Favorites => "favorites",
            StorageKey::Queue => "queue",
            StorageKey::Downloads => "downloads",
            StorageKey::Theme => "theme",
        }
    }
}

/// Opaque string store. Values are JSON documents written in full.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<String>>;
    async fn set(&self, key: StorageKey, value: String) -> Result<()>;
}

/// One `<key>.json` file per key under a root directory
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn set(&self, key: StorageKey, value: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.path_for(key);
        tokio::fs::write(&path, value)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::trace!(key = key.as_str(), path = %path.display(), "Stored value");
        Ok(())
    }
}

/// In-process store for tests and embedders that persist elsewhere
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<StorageKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: String) -> Result<()> {
        self.values.write().await.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_store_round_trips_and_reports_missing_keys() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("state"));

        assert_eq!(store.get(StorageKey::Queue).await.expect("get"), None);
        store
            .set(StorageKey::Queue, "[]".to_string())
            .await
            .expect("set");
        assert_eq!(
            store.get(StorageKey::Queue).await.expect("get").as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("state").join("queue.json").exists());
    }

    #[tokio::test]
    async fn memory_store_overwrites_in_full() {
        let store = MemoryStore::new();
        store.set(StorageKey::Theme, "light".to_string()).await.expect("set");
        store.set(StorageKey::Theme, "dark".to_string()).await.expect("set");
        assert_eq!(
            store.get(StorageKey::Theme).await.expect("get").as_deref(),
            Some("dark")
        );
    }
}
