//! Key-value settings store.
//!
//! Holds the last-used setup (client, set size, toggles, decks) and the
//! missed set saved from a previous session. Values are JSON strings under
//! fixed keys, so a store written by one front end is readable by another.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use trialkit_core::model::Deck;

/// Key for the saved missed item ids.
pub const MISSED_SET_KEY: &str = "vbmapp_tacts_missed_set_v1";
/// Key for the last-used setup.
pub const LAST_SETTINGS_KEY: &str = "vbmapp_tacts_last_settings_v1";

/// Opaque string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store for tests and one-off runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk; every write is flushed.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store, starting empty when the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read store: {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("failed to parse store: {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values).context("failed to serialize store")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write store to {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Last-used setup, stored in the browser-compatible camelCase shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub client_name: String,
    /// Kept as the raw text the setup field held.
    #[serde(default = "default_set_size")]
    pub set_size: String,
    #[serde(default, rename = "toggleGen")]
    pub generalization: bool,
    #[serde(default = "default_true", rename = "toggleShuffleExemplars")]
    pub shuffle_exemplars: bool,
    #[serde(default = "default_decks")]
    pub decks: Vec<Deck>,
}

fn default_set_size() -> String {
    "10".to_string()
}

fn default_true() -> bool {
    true
}

fn default_decks() -> Vec<Deck> {
    vec![Deck::Nouns]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_name: String::new(),
            set_size: default_set_size(),
            generalization: false,
            shuffle_exemplars: true,
            decks: default_decks(),
        }
    }
}

impl Settings {
    /// Parsed set size; `None` when the stored text is not a number.
    pub fn set_size_value(&self) -> Option<usize> {
        self.set_size.trim().parse().ok()
    }
}

/// Read the last-used settings. Unreadable values fall back to defaults.
pub fn load_settings(store: &dyn KeyValueStore) -> Settings {
    match store.get(LAST_SETTINGS_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable saved settings: {e}");
            Settings::default()
        }),
        Ok(None) => Settings::default(),
        Err(e) => {
            tracing::warn!("settings store unavailable: {e:#}");
            Settings::default()
        }
    }
}

pub fn save_settings(store: &mut dyn KeyValueStore, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string(settings).context("failed to serialize settings")?;
    store.set(LAST_SETTINGS_KEY, &json)
}

/// Saved missed ids; empty when none are stored or the value is unreadable.
pub fn load_missed_set(store: &dyn KeyValueStore) -> Vec<String> {
    store
        .get(MISSED_SET_KEY)
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
        .unwrap_or_default()
}

pub fn has_missed_set(store: &dyn KeyValueStore) -> bool {
    !load_missed_set(store).is_empty()
}

pub fn save_missed_set(store: &mut dyn KeyValueStore, ids: &[String]) -> Result<()> {
    let json = serde_json::to_string(ids).context("failed to serialize missed set")?;
    store.set(MISSED_SET_KEY, &json)
}

pub fn clear_missed_set(store: &mut dyn KeyValueStore) -> Result<()> {
    store.remove(MISSED_SET_KEY)
}
