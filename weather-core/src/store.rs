//! Persisted preferences over a string key-value backend.
//!
//! Read failures degrade to defaults and write failures report `false`; neither
//! propagates. Callers cannot tell "nothing stored" from "read failed".

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    path::PathBuf,
    sync::Arc,
};
use tracing::{debug, warn};

use crate::model::{Coordinates, FavoriteLocation, TemperatureUnit, ThemeMode};

pub const FAVORITES_KEY: &str = "favorites";
pub const TEMPERATURE_UNIT_KEY: &str = "temperature_unit";
pub const THEME_MODE_KEY: &str = "theme_mode";
pub const LAST_LOCATION_KEY: &str = "last_location";

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// All entries in one JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write of the file within this process.
    io: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), io: tokio::sync::Mutex::new(()) }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse preferences: {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read preferences: {}", self.path.display())),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.io.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.io.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.io.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e)
                .with_context(|| format!("Failed to remove preferences: {}", self.path.display())),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

/// Typed access to favorites, unit, theme and last location.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.backend.get_item(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %format!("{e:#}"), "failed to read preference");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) -> bool {
        match self.backend.set_item(key, value).await {
            Ok(()) => {
                debug!(key, "saved preference");
                true
            }
            Err(e) => {
                warn!(key, error = %format!("{e:#}"), "failed to save preference");
                false
            }
        }
    }

    /// Saved favorites in insertion order; empty when absent or unreadable.
    pub async fn get_favorites(&self) -> Vec<FavoriteLocation> {
        let Some(raw) = self.read(FAVORITES_KEY).await else {
            return Vec::new();
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "stored favorites are not valid JSON");
            Vec::new()
        })
    }

    pub async fn save_favorites(&self, favorites: &[FavoriteLocation]) -> bool {
        match serde_json::to_string(favorites) {
            Ok(json) => self.write(FAVORITES_KEY, &json).await,
            Err(e) => {
                warn!(error = %e, "failed to serialize favorites");
                false
            }
        }
    }

    /// Append `favorite` unless an entry with the same name and country exists.
    /// Returns whether it was added.
    pub async fn add_favorite(&self, favorite: FavoriteLocation) -> bool {
        let mut favorites = self.get_favorites().await;
        if favorites.iter().any(|f| f.same_place(&favorite.name, &favorite.country)) {
            return false;
        }

        favorites.push(favorite);
        self.save_favorites(&favorites).await
    }

    /// Drop every favorite called `name`. Missing names are not an error.
    pub async fn remove_favorite(&self, name: &str) -> bool {
        let mut favorites = self.get_favorites().await;
        favorites.retain(|f| f.name != name);
        self.save_favorites(&favorites).await
    }

    pub async fn get_temperature_unit(&self) -> TemperatureUnit {
        self.read(TEMPERATURE_UNIT_KEY)
            .await
            .and_then(|raw| TemperatureUnit::try_from(raw.as_str()).ok())
            .unwrap_or_default()
    }

    pub async fn save_temperature_unit(&self, unit: TemperatureUnit) -> bool {
        self.write(TEMPERATURE_UNIT_KEY, unit.as_str()).await
    }

    pub async fn get_theme_mode(&self) -> ThemeMode {
        self.read(THEME_MODE_KEY)
            .await
            .and_then(|raw| ThemeMode::try_from(raw.as_str()).ok())
            .unwrap_or_default()
    }

    pub async fn save_theme_mode(&self, mode: ThemeMode) -> bool {
        self.write(THEME_MODE_KEY, mode.as_str()).await
    }

    pub async fn get_last_location(&self) -> Option<Coordinates> {
        let raw = self.read(LAST_LOCATION_KEY).await?;
        serde_json::from_str(&raw)
            .map_err(|e| warn!(error = %e, "stored last location is not valid JSON"))
            .ok()
    }

    pub async fn save_last_location(&self, coords: Coordinates) -> bool {
        match serde_json::to_string(&coords) {
            Ok(json) => self.write(LAST_LOCATION_KEY, &json).await,
            Err(e) => {
                warn!(error = %e, "failed to serialize last location");
                false
            }
        }
    }

    pub async fn clear_all(&self) -> bool {
        match self.backend.clear().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "failed to clear preferences");
                false
            }
        }
    }
}
