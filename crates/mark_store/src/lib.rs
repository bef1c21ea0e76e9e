//! Per-word highlight counters, cached in memory and persisted to a [`KeyValueStore`].

mod backend;
mod settings;

pub use self::backend::{
    JsonFileStore, KeyValueStore, MemoryStore, StorageMap, DEFAULT_DATA_FILE_NAME,
};
pub use self::settings::{Settings, DEFAULT_BASE_COLOR, SETTINGS_KEY};

use boundary::normalize_word;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Highest count a word can reach, the last shade of the palette.
pub const MAX_MARK_COUNT: u8 = 5;

pub const WORD_MARKINGS_KEY: &str = "wordMarkings";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordMark {
    pub word: String,
    pub count: u8,
}

#[derive(Debug)]
pub struct MarkStore {
    backend: Arc<dyn KeyValueStore>,
    counts: parking_lot::Mutex<HashMap<String, u8>>,
    /// Held for the duration of a backend write so that writes land in order.
    persist_lock: tokio::sync::Mutex<()>,
    /// Set while the stored marks have not been read, no write may replace them.
    degraded: AtomicBool,
}

impl MarkStore {
    /// Warms the cache from the backend.
    ///
    /// An unreadable backend leaves the store empty and degraded: the stored marks are read
    /// again before the next change and merged with the ones recorded in the meantime. Writes
    /// are skipped until that read succeeds.
    pub async fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let (counts, degraded) = match backend.get(&[WORD_MARKINGS_KEY]).await {
            Ok(mut items) => (
                items
                    .remove(WORD_MARKINGS_KEY)
                    .map(parse_markings)
                    .unwrap_or_default(),
                false,
            ),
            Err(err) => {
                tracing::warn!(?err, "Mark storage is unavailable, keeping marks in memory");
                (HashMap::new(), true)
            }
        };

        tracing::debug!(total = counts.len(), degraded, "Loaded word marks");

        Self {
            backend,
            counts: parking_lot::Mutex::new(counts),
            persist_lock: tokio::sync::Mutex::new(()),
            degraded: AtomicBool::new(degraded),
        }
    }

    /// Empty store over a [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryStore::new()),
            counts: Default::default(),
            persist_lock: tokio::sync::Mutex::new(()),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    pub fn get_count(&self, word: &str) -> u8 {
        self.counts
            .lock()
            .get(&normalize_word(word))
            .copied()
            .unwrap_or(0)
    }

    /// Bumps the count of `word`, saturating at [`MAX_MARK_COUNT`], and returns the new count.
    ///
    /// A failed write is logged and the in-memory count is kept.
    pub async fn record_occurrence(&self, word: &str) -> u8 {
        let word = normalize_word(word);
        if word.is_empty() {
            return 0;
        }

        self.recover().await;

        let count = {
            let mut counts = self.counts.lock();
            let count = counts.entry(word.clone()).or_insert(0);
            *count = count.saturating_add(1).min(MAX_MARK_COUNT);
            *count
        };

        tracing::debug!(%word, count, "Recorded occurrence");

        self.persist().await;

        count
    }

    /// Lowers the count of `word` by one, forgetting the word once it reaches zero.
    pub async fn decrement(&self, word: &str) -> u8 {
        let word = normalize_word(word);

        self.recover().await;

        let count = {
            let mut counts = self.counts.lock();
            match counts.get_mut(&word) {
                Some(count) if *count > 1 => {
                    *count -= 1;
                    *count
                }
                Some(_) => {
                    counts.remove(&word);
                    0
                }
                None => return 0,
            }
        };

        self.persist().await;

        count
    }

    /// Returns `true` if the word was marked.
    pub async fn remove(&self, word: &str) -> bool {
        self.recover().await;

        let removed = self.counts.lock().remove(&normalize_word(word)).is_some();
        if removed {
            self.persist().await;
        }
        removed
    }

    /// Forgets every mark, including the stored ones a degraded store never read.
    pub async fn clear(&self) {
        self.counts.lock().clear();
        self.degraded.store(false, Ordering::Release);
        self.persist().await;
    }

    /// Whether the stored marks are still unread after a failed load.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Snapshot of all marks, sorted by word.
    pub fn marks(&self) -> Vec<WordMark> {
        let mut marks = self
            .counts
            .lock()
            .iter()
            .map(|(word, &count)| WordMark {
                word: word.clone(),
                count,
            })
            .collect::<Vec<_>>();
        marks.sort_by(|a, b| a.word.cmp(&b.word));
        marks
    }

    pub fn len(&self) -> usize {
        self.counts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }

    async fn recover(&self) {
        if !self.is_degraded() {
            return;
        }
        let _guard = self.persist_lock.lock().await;
        if self.is_degraded() {
            self.reconcile().await;
        }
    }

    /// Reads the stored marks back and adds them to the cached counts, which only hold
    /// occurrences recorded since the failed load. Must be called under `persist_lock`.
    async fn reconcile(&self) -> bool {
        let stored = match self.backend.get(&[WORD_MARKINGS_KEY]).await {
            Ok(mut items) => items
                .remove(WORD_MARKINGS_KEY)
                .map(parse_markings)
                .unwrap_or_default(),
            Err(err) => {
                tracing::warn!(?err, "Mark storage is still unavailable");
                return false;
            }
        };

        {
            let mut counts = self.counts.lock();
            for (word, count) in stored {
                let entry = counts.entry(word).or_insert(0);
                *entry = entry.saturating_add(count).min(MAX_MARK_COUNT);
            }
            tracing::debug!(total = counts.len(), "Recovered stored word marks");
        }

        self.degraded.store(false, Ordering::Release);
        true
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;

        if self.is_degraded() && !self.reconcile().await {
            tracing::warn!("Skipping mark write, the stored marks were never read");
            return;
        }

        // Taken after acquiring the lock, the last write always carries every update.
        let snapshot = {
            let counts = self.counts.lock();
            serde_json::Value::Object(
                counts
                    .iter()
                    .map(|(word, &count)| (word.clone(), count.into()))
                    .collect(),
            )
        };

        let mut items = StorageMap::new();
        items.insert(WORD_MARKINGS_KEY.to_string(), snapshot);

        if let Err(err) = self.backend.set(items).await {
            tracing::error!(?err, "Failed to persist word marks");
        }
    }
}

/// Normalizes the keys, clamps the counts to [`MAX_MARK_COUNT`] and drops non-positive entries.
fn parse_markings(value: serde_json::Value) -> HashMap<String, u8> {
    let entries = match value {
        serde_json::Value::Object(entries) => entries,
        other => {
            tracing::warn!(%other, "Ignoring malformed word marks");
            return HashMap::new();
        }
    };

    let mut counts = HashMap::with_capacity(entries.len());
    for (word, count) in entries {
        let word = normalize_word(&word);
        let Some(count) = count.as_f64() else {
            continue;
        };
        if word.is_empty() || count < 1.0 {
            continue;
        }
        let count = (count as u64).min(MAX_MARK_COUNT as u64) as u8;
        let entry = counts.entry(word).or_insert(0);
        *entry = (*entry).max(count);
    }
    counts
}
