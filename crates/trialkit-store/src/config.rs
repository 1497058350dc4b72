//! Application configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use trialkit_core::advance::CorrectionPolicy;

/// Top-level trialkit configuration (`trialkit.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialkitConfig {
    /// Item catalog (`.json` array or `.toml` with `[[items]]`).
    #[serde(default = "default_targets")]
    pub targets: PathBuf,
    /// JSON file backing the settings store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Where CSV/HTML exports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// What the drill does after an incorrect response.
    #[serde(default = "default_drill_policy")]
    pub drill_policy: CorrectionPolicy,
    /// What the matching game does after an incorrect selection.
    #[serde(default = "default_match_policy")]
    pub match_policy: CorrectionPolicy,
    /// Feedback delay before advancing after a correct answer.
    #[serde(default = "default_correct_delay")]
    pub correct_delay_ms: u64,
    /// Feedback delay while the correct answer is highlighted after an error.
    #[serde(default = "default_correction_delay")]
    pub correction_delay_ms: u64,
    /// Drill pause between a response and the next trial.
    #[serde(default)]
    pub drill_advance_delay_ms: u64,
    /// Matching-game array size.
    #[serde(default = "default_array_size")]
    pub array_size: usize,
}

fn default_targets() -> PathBuf {
    PathBuf::from("targets.json")
}
fn default_store_path() -> PathBuf {
    PathBuf::from(".trialkit/settings.json")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./trialkit-results")
}
fn default_drill_policy() -> CorrectionPolicy {
    CorrectionPolicy::AlwaysAdvance
}
fn default_match_policy() -> CorrectionPolicy {
    CorrectionPolicy::RepeatOnError
}
fn default_correct_delay() -> u64 {
    650
}
fn default_correction_delay() -> u64 {
    900
}
fn default_array_size() -> usize {
    4
}

impl Default for TrialkitConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            store_path: default_store_path(),
            output_dir: default_output_dir(),
            drill_policy: default_drill_policy(),
            match_policy: default_match_policy(),
            correct_delay_ms: default_correct_delay(),
            correction_delay_ms: default_correction_delay(),
            drill_advance_delay_ms: 0,
            array_size: default_array_size(),
        }
    }
}

/// Expand `${VAR}` references in one left-to-right pass.
///
/// Unset variables expand to an empty string. Substituted values are not
/// scanned again, and an unterminated `${` is kept as written.
fn resolve_env_vars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(&std::env::var(&after[..end]).unwrap_or_default());
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `trialkit.toml` in the current directory
/// 2. `~/.config/trialkit/config.toml`
///
/// Environment variable overrides: `TRIALKIT_TARGETS`, `TRIALKIT_STORE`.
pub fn load_config_from(path: Option<&Path>) -> Result<TrialkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("trialkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<TrialkitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => TrialkitConfig::default(),
    };

    if let Ok(targets) = std::env::var("TRIALKIT_TARGETS") {
        config.targets = PathBuf::from(targets);
    }
    if let Ok(store) = std::env::var("TRIALKIT_STORE") {
        config.store_path = PathBuf::from(store);
    }

    config.targets = resolve_path(&config.targets);
    config.store_path = resolve_path(&config.store_path);
    config.output_dir = resolve_path(&config.output_dir);

    anyhow::ensure!(config.array_size >= 1, "array_size must be at least 1");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("trialkit"))
}
