//! The `trialkit validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use trialkit_core::catalog::{deck_counts, load_catalog, validate_catalog};
use trialkit_store::load_config_from;

pub fn execute(targets: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let path = match targets {
        Some(path) => path,
        None => load_config_from(config.as_deref())?.targets,
    };
    let items = load_catalog(&path)
        .with_context(|| format!("failed to load catalog {}", path.display()))?;

    println!("Catalog: {} ({} concepts)", path.display(), items.len());
    for (deck, count) in deck_counts(&items) {
        println!("  {deck}: {count}");
    }

    let warnings = validate_catalog(&items);
    for w in &warnings {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Catalog valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
