use crate::{KeyValueStore, StorageMap, StoreError};
use serde::{Deserialize, Serialize};

pub const SETTINGS_KEY: &str = "settings";

pub const DEFAULT_BASE_COLOR: &str = "yellow";

/// User settings persisted next to the word marks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Palette the marker classes are derived from.
    pub highlight_base_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            highlight_base_color: DEFAULT_BASE_COLOR.to_string(),
        }
    }
}

impl Settings {
    pub async fn load(backend: &dyn KeyValueStore) -> Self {
        Self::load_or(backend, Self::default()).await
    }

    /// Returns `fallback` when the backend is unreadable or holds no usable settings.
    pub async fn load_or(backend: &dyn KeyValueStore, fallback: Self) -> Self {
        let value = match backend.get(&[SETTINGS_KEY]).await {
            Ok(mut items) => items.remove(SETTINGS_KEY),
            Err(err) => {
                tracing::warn!(?err, "Failed to read settings, using the defaults");
                None
            }
        };

        let Some(value) = value else {
            return fallback;
        };

        match serde_json::from_value::<Self>(value) {
            Ok(settings) if !settings.highlight_base_color.trim().is_empty() => settings,
            Ok(_) => fallback,
            Err(err) => {
                tracing::warn!(?err, "Malformed settings, using the defaults");
                fallback
            }
        }
    }

    pub async fn save(&self, backend: &dyn KeyValueStore) -> Result<(), StoreError> {
        let mut items = StorageMap::new();
        items.insert(SETTINGS_KEY.to_string(), serde_json::to_value(self)?);
        backend.set(items).await
    }
}
