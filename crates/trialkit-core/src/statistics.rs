//! Session summary statistics.
//!
//! Accuracy overall and per deck, plus the missed set: every item answered
//! incorrectly at least once, deduplicated, in first-seen order.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Deck, ResultRecord};
use crate::session::Session;

/// Correct/total counts for one deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total: usize,
    pub correct: usize,
}

impl DeckStats {
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }
}

/// An item in the missed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedItem {
    pub id: String,
    pub label: String,
}

/// Summary of the answered trials of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub correct: usize,
    /// `correct / total`, or 0 when nothing was answered.
    pub accuracy: f64,
    pub by_deck: BTreeMap<Deck, DeckStats>,
    pub missed: Vec<MissedItem>,
}

impl Summary {
    pub fn missed_ids(&self) -> Vec<String> {
        self.missed.iter().map(|m| m.id.clone()).collect()
    }

    /// Whole-percent accuracy, e.g. `70` for 0.7.
    pub fn percent(&self) -> u32 {
        (self.accuracy * 100.0).round() as u32
    }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// Summarize the answered slots of a session. Pure; safe to call repeatedly.
pub fn compute_summary(session: &Session) -> Summary {
    summarize_records(session.answered())
}

/// Summarize any sequence of result records (e.g. rows read back from an export).
pub fn summarize_records<'a, I>(records: I) -> Summary
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let mut total = 0;
    let mut correct = 0;
    let mut by_deck: BTreeMap<Deck, DeckStats> = BTreeMap::new();
    let mut missed = Vec::new();
    let mut missed_seen = HashSet::new();

    for record in records {
        total += 1;
        let deck = by_deck.entry(record.deck).or_default();
        deck.total += 1;
        if record.outcome.is_correct() {
            correct += 1;
            deck.correct += 1;
        } else if missed_seen.insert(record.item_id.clone()) {
            missed.push(MissedItem {
                id: record.item_id.clone(),
                label: record.item_label.clone(),
            });
        }
    }

    Summary {
        total,
        correct,
        accuracy: ratio(correct, total),
        by_deck,
        missed,
    }
}
