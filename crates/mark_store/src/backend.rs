//! Key/value storage the marks and the settings are persisted to.
//!
//! The layout mirrors the extension storage area: a flat JSON object whose top level keys are
//! read and written as a whole.

use crate::StoreError;
use dirs::Dirs;
use parking_lot::{Mutex, RwLock};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

pub type StorageMap = serde_json::Map<String, serde_json::Value>;

/// Linux: ~/.local/share/wordmark/word_marks.json
pub const DEFAULT_DATA_FILE_NAME: &str = "word_marks.json";

#[async_trait::async_trait]
pub trait KeyValueStore: Debug + Send + Sync + 'static {
    /// Returns the values of the requested keys, absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> Result<StorageMap, StoreError>;

    /// Writes every entry of `items`, leaving the other keys untouched.
    async fn set(&self, items: StorageMap) -> Result<(), StoreError>;
}

/// Storage which lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<StorageMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<StorageMap, StoreError> {
        let items = self.items.read();
        Ok(pick(&items, keys))
    }

    async fn set(&self, items: StorageMap) -> Result<(), StoreError> {
        self.items.write().extend(items);
        Ok(())
    }
}

/// Storage backed by a single JSON file, rewritten as a whole on each `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes the read-merge-write cycle of `set`.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store located in the project data directory.
    pub fn in_data_dir() -> std::io::Result<Self> {
        Dirs::data_file(DEFAULT_DATA_FILE_NAME).map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<StorageMap, StoreError> {
        match utils::read_to_string_if_exists(&self.path)? {
            Some(contents) if !contents.trim().is_empty() => Ok(serde_json::from_str(&contents)?),
            _ => Ok(StorageMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<StorageMap, StoreError> {
        let items = self.read_all()?;
        Ok(pick(&items, keys))
    }

    async fn set(&self, items: StorageMap) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut all = self.read_all()?;
        all.extend(items);
        utils::create_or_overwrite(&self.path, serde_json::to_string(&all)?.as_bytes())?;
        Ok(())
    }
}

fn pick(items: &StorageMap, keys: &[&str]) -> StorageMap {
    keys.iter()
        .filter_map(|&key| items.get(key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> StorageMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        store.set(map(json!({ "a": 1, "b": 2 }))).await.unwrap();
        store.set(map(json!({ "b": 3 }))).await.unwrap();

        let items = store.get(&["a", "b", "missing"]).await.unwrap();
        assert_eq!(serde_json::Value::Object(items), json!({ "a": 1, "b": 3 }));
    }

    #[tokio::test]
    async fn test_json_file_store_merges_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join(DEFAULT_DATA_FILE_NAME);
        let store = JsonFileStore::new(&path);

        assert!(store.get(&["wordMarkings"]).await.unwrap().is_empty());

        store
            .set(map(json!({ "wordMarkings": { "hello": 2 } })))
            .await
            .unwrap();
        store
            .set(map(json!({ "settings": { "highlightBaseColor": "green" } })))
            .await
            .unwrap();

        let reopened = JsonFileStore::new(&path);
        let items = reopened.get(&["wordMarkings", "settings"]).await.unwrap();
        assert_eq!(
            serde_json::Value::Object(items),
            json!({
                "wordMarkings": { "hello": 2 },
                "settings": { "highlightBaseColor": "green" },
            })
        );
    }

    #[tokio::test]
    async fn test_json_file_store_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DATA_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get(&["wordMarkings"]).await,
            Err(StoreError::Json(_))
        ));
    }
}
