//! The `trialkit missed` command.

use std::path::PathBuf;

use anyhow::Result;

use trialkit_store::{
    clear_missed_set, has_missed_set, load_config_from, load_missed_set, JsonFileStore,
};

pub fn execute(clear: bool, config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let mut store = JsonFileStore::open(&config.store_path)?;

    if !has_missed_set(&store) {
        println!("No saved missed set.");
        return Ok(());
    }

    if clear {
        clear_missed_set(&mut store)?;
        println!("Cleared saved missed set.");
        return Ok(());
    }

    let ids = load_missed_set(&store);
    println!("Saved missed set ({}):", ids.len());
    for id in &ids {
        println!("  {id}");
    }
    println!("\nRun `trialkit drill --missed` to practice them.");

    Ok(())
}
