//! trialkit-store — app configuration and the persisted settings store.
//!
//! Loads `trialkit.toml` and keeps the last-used setup and the missed set
//! between runs.

pub mod config;
pub mod store;

pub use config::{load_config_from, TrialkitConfig};
pub use store::{
    clear_missed_set, has_missed_set, load_missed_set, load_settings, save_missed_set,
    save_settings, JsonFileStore, KeyValueStore, MemoryStore, Settings,
};
