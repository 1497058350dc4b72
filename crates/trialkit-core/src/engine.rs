//! Trial generation.
//!
//! Samples items without replacement, expands exemplars in generalization
//! mode, and builds target-plus-distractor arrays for the matching game.
//! Every function takes its RNG explicitly so callers can seed it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{Item, Trial, TrialOption};

/// Configuration for building a session's trial list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Number of items drawn from the pool.
    pub set_size: usize,
    /// Turn every exemplar of a selected item into its own trial.
    pub generalization: bool,
    /// Shuffle exemplar order within an item (generalization mode only).
    pub shuffle_exemplars: bool,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            set_size: 10,
            generalization: false,
            shuffle_exemplars: true,
        }
    }
}

/// Draw up to `n` distinct elements uniformly at random.
pub fn pick_random_unique<T: Clone, R: Rng + ?Sized>(items: &[T], n: usize, rng: &mut R) -> Vec<T> {
    let mut copy = items.to_vec();
    copy.shuffle(rng);
    copy.truncate(n.min(items.len()));
    copy
}

/// Build the ordered trial list for a session.
///
/// Draws `min(set_size, pool.len())` items, expands them into trials and
/// shuffles the combined list so decks and exemplars interleave.
pub fn build_trials<R: Rng + ?Sized>(
    pool: &[Item],
    config: &TrialConfig,
    rng: &mut R,
) -> Result<Vec<Trial>, EngineError> {
    if config.set_size < 1 {
        return Err(EngineError::InvalidSetSize(config.set_size));
    }
    let eligible: Vec<Item> = pool.iter().filter(|i| i.is_eligible()).cloned().collect();
    if eligible.is_empty() {
        return Err(EngineError::EmptyPool);
    }

    let selected = pick_random_unique(&eligible, config.set_size, rng);
    let trials = expand_items(&selected, config, rng);

    tracing::debug!(
        items = selected.len(),
        trials = trials.len(),
        generalization = config.generalization,
        "built trial list"
    );
    Ok(trials)
}

/// Expand already-selected items into trials without further sampling.
pub fn expand_items<R: Rng + ?Sized>(items: &[Item], config: &TrialConfig, rng: &mut R) -> Vec<Trial> {
    let mut trials = Vec::new();

    for item in items.iter().filter(|i| i.is_eligible()) {
        if config.generalization {
            let mut exemplars = item.exemplars.clone();
            if config.shuffle_exemplars {
                exemplars.shuffle(rng);
            }
            let total = exemplars.len();
            for (idx, exemplar) in exemplars.iter().enumerate() {
                trials.push(Trial::single(item, exemplar, idx + 1, total));
            }
        } else if let Some(exemplar) = item.exemplars.choose(rng) {
            trials.push(Trial::single(item, exemplar, 1, 1));
        }
    }

    trials.shuffle(rng);
    trials
}

/// Build a multiple-choice trial: the target plus `array_size - 1` distractors.
///
/// Distractors are distinct items other than the target. The array shrinks
/// when the list has too few items, and option order is shuffled so the
/// target position is unpredictable.
pub fn build_distractor_trial<R: Rng + ?Sized>(
    target: &Item,
    items: &[Item],
    array_size: usize,
    rng: &mut R,
) -> Result<Trial, EngineError> {
    if array_size < 1 {
        return Err(EngineError::InvalidArraySize(array_size));
    }
    let target_exemplar = target
        .exemplars
        .choose(rng)
        .ok_or(EngineError::EmptyPool)?
        .clone();

    let mut seen = std::collections::HashSet::new();
    seen.insert(target.id.as_str());
    let remainder: Vec<&Item> = items
        .iter()
        .filter(|i| i.is_eligible() && seen.insert(i.id.as_str()))
        .collect();

    let mut options = vec![TrialOption {
        item_id: target.id.clone(),
        label: target.label.clone(),
        exemplar: target_exemplar.clone(),
    }];
    for item in pick_random_unique(&remainder, array_size - 1, rng) {
        if let Some(exemplar) = item.exemplars.choose(rng) {
            options.push(TrialOption {
                item_id: item.id.clone(),
                label: item.label.clone(),
                exemplar: exemplar.clone(),
            });
        }
    }
    options.shuffle(rng);

    let mut trial = Trial::single(target, &target_exemplar, 1, 1);
    trial.options = options;
    Ok(trial)
}
