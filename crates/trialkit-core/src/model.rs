//! Core data model types for trialkit.
//!
//! These are the fundamental types the engine, the drill controller and the
//! matching game share: catalog items, generated trials and scored results.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of decks an item can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deck {
    Nouns,
    Actions,
    Combos,
    Pronouns,
    Prepositions,
}

impl Deck {
    /// Every deck, in the order setup screens list them.
    pub const ALL: [Deck; 5] = [
        Deck::Nouns,
        Deck::Actions,
        Deck::Combos,
        Deck::Pronouns,
        Deck::Prepositions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Deck::Nouns => "nouns",
            Deck::Actions => "actions",
            Deck::Combos => "combos",
            Deck::Pronouns => "pronouns",
            Deck::Prepositions => "prepositions",
        }
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Deck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nouns" => Ok(Deck::Nouns),
            "actions" => Ok(Deck::Actions),
            "combos" => Ok(Deck::Combos),
            "pronouns" => Ok(Deck::Pronouns),
            "prepositions" => Ok(Deck::Prepositions),
            other => Err(format!("unknown deck: {other}")),
        }
    }
}

/// A concept loaded from the item catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: String,
    /// Display label (the expected tact).
    pub label: String,
    /// Deck this item belongs to.
    pub deck: Deck,
    /// Media references, at least one for an eligible item.
    pub exemplars: Vec<String>,
    /// Object named in the prepositions prompt ("Where is the ball?").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_object: Option<String>,
}

impl Item {
    /// Whether the item can produce a trial.
    pub fn is_eligible(&self) -> bool {
        !self.exemplars.is_empty()
    }
}

/// One choice in a multiple-choice trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOption {
    pub item_id: String,
    pub label: String,
    /// Exemplar shown for this option.
    pub exemplar: String,
}

/// A single presentation derived from one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub item_id: String,
    pub item_label: String,
    pub deck: Deck,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_object: Option<String>,
    /// Exemplar presented for this trial.
    pub exemplar: String,
    /// 1-based position within the item's exemplar group.
    pub exemplar_index: usize,
    /// Size of the item's exemplar group (1 unless generalization expanded it).
    pub exemplar_total: usize,
    /// Target plus distractors, empty for slideshow trials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<TrialOption>,
}

impl Trial {
    /// A slideshow trial showing `exemplar` of `item`.
    pub fn single(item: &Item, exemplar: &str, index: usize, total: usize) -> Self {
        Self {
            item_id: item.id.clone(),
            item_label: item.label.clone(),
            deck: item.deck,
            prompt_object: item.prompt_object.clone(),
            exemplar: exemplar.to_string(),
            exemplar_index: index,
            exemplar_total: total,
            options: Vec::new(),
        }
    }

    /// The spoken discriminative stimulus for this trial.
    pub fn sd_text(&self) -> String {
        match self.deck {
            Deck::Nouns => "What is it?".to_string(),
            Deck::Actions => "What are they doing?".to_string(),
            Deck::Combos => "Tell me what\u{2019}s happening?".to_string(),
            Deck::Pronouns => "Who is it?".to_string(),
            Deck::Prepositions => {
                let object = self
                    .prompt_object
                    .as_deref()
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .unwrap_or("it");
                format!("Where is the {object}?")
            }
        }
    }
}

/// How the learner responded to a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn from_bool(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Outcome::Correct)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Correct => write!(f, "correct"),
            Outcome::Incorrect => write!(f, "incorrect"),
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "correct" => Ok(Outcome::Correct),
            "incorrect" => Ok(Outcome::Incorrect),
            other => Err(format!("unknown result: {other}")),
        }
    }
}

/// A scored response, snapshotting the trial it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// 1-based trial position in the session.
    pub trial_index: usize,
    pub item_id: String,
    pub item_label: String,
    pub deck: Deck,
    pub sd_text: String,
    pub exemplar_index: usize,
    pub exemplar_total: usize,
    pub exemplar: String,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

impl ResultRecord {
    pub fn new(position: usize, trial: &Trial, outcome: Outcome, at: DateTime<Utc>) -> Self {
        Self {
            trial_index: position + 1,
            item_id: trial.item_id.clone(),
            item_label: trial.item_label.clone(),
            deck: trial.deck,
            sd_text: trial.sd_text(),
            exemplar_index: trial.exemplar_index,
            exemplar_total: trial.exemplar_total,
            exemplar: trial.exemplar.clone(),
            outcome,
            timestamp: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(deck: Deck, prompt_object: Option<&str>) -> Item {
        Item {
            id: "x".into(),
            label: "X".into(),
            deck,
            exemplars: vec!["assets/x.png".into()],
            prompt_object: prompt_object.map(String::from),
        }
    }

    #[test]
    fn deck_display_and_parse() {
        assert_eq!(Deck::Prepositions.to_string(), "prepositions");
        assert_eq!("Nouns".parse::<Deck>().unwrap(), Deck::Nouns);
        assert_eq!(" actions ".parse::<Deck>().unwrap(), Deck::Actions);
        assert!("verbs".parse::<Deck>().is_err());
    }

    #[test]
    fn sd_text_per_deck() {
        let sd = |deck| Trial::single(&item(deck, None), "a.png", 1, 1).sd_text();
        assert_eq!(sd(Deck::Nouns), "What is it?");
        assert_eq!(sd(Deck::Actions), "What are they doing?");
        assert_eq!(sd(Deck::Combos), "Tell me what’s happening?");
        assert_eq!(sd(Deck::Pronouns), "Who is it?");
        assert_eq!(sd(Deck::Prepositions), "Where is the it?");
    }

    #[test]
    fn sd_text_prepositions_uses_trimmed_object() {
        let trial = Trial::single(&item(Deck::Prepositions, Some("  ball ")), "a.png", 1, 1);
        assert_eq!(trial.sd_text(), "Where is the ball?");

        let blank = Trial::single(&item(Deck::Prepositions, Some("   ")), "a.png", 1, 1);
        assert_eq!(blank.sd_text(), "Where is the it?");
    }

    #[test]
    fn outcome_roundtrip_strings() {
        assert_eq!(Outcome::Correct.to_string(), "correct");
        assert_eq!("incorrect".parse::<Outcome>().unwrap(), Outcome::Incorrect);
        assert!("maybe".parse::<Outcome>().is_err());
        assert!(Outcome::from_bool(true).is_correct());
    }

    #[test]
    fn result_record_is_one_based() {
        let trial = Trial::single(&item(Deck::Nouns, None), "a.png", 2, 3);
        let record = ResultRecord::new(0, &trial, Outcome::Correct, Utc::now());
        assert_eq!(record.trial_index, 1);
        assert_eq!(record.exemplar_index, 2);
        assert_eq!(record.exemplar_total, 3);
        assert_eq!(record.sd_text, "What is it?");
    }
}
