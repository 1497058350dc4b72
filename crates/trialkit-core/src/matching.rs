//! Picture-matching game: target plus distractors, with error correction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::advance::{AdvanceToken, CorrectionPolicy, Generation, Pending};
use crate::engine::build_distractor_trial;
use crate::error::EngineError;
use crate::model::{Deck, Item, Trial};
use crate::session::new_session_id;

/// Built-in noun targets.
pub const NOUNS: [&str; 30] = [
    "apple", "banana", "orange", "cookie", "cracker", "cup", "spoon", "fork", "plate", "bottle",
    "ball", "car", "truck", "bus", "train", "airplane", "shoes", "socks", "pants", "shirt", "hat",
    "jacket", "glasses", "book", "pencil", "crayon", "phone", "chair", "bed", "door",
];

const NOUN_IMAGE_DIR: &str = "assets/nouns";
const EXEMPLARS_PER_NOUN: usize = 3;

/// The built-in noun list as catalog items (`assets/nouns/{noun}_{1..3}.png`).
pub fn builtin_nouns() -> Vec<Item> {
    NOUNS
        .iter()
        .map(|noun| Item {
            id: noun.to_string(),
            label: noun.to_string(),
            deck: Deck::Nouns,
            exemplars: (1..=EXEMPLARS_PER_NOUN)
                .map(|n| format!("{NOUN_IMAGE_DIR}/{noun}_{n}.png"))
                .collect(),
            prompt_object: None,
        })
        .collect()
}

/// How the target is prompted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// "Find the apple." The learner selects the picture.
    Receptive,
    /// "What is it?" The learner labels the picture.
    Expressive,
}

impl MatchMode {
    pub fn prompt(&self, label: &str) -> String {
        match self {
            MatchMode::Receptive => format!("Find the {label}."),
            MatchMode::Expressive => "What is it?".to_string(),
        }
    }

    /// Note shown to the therapist alongside the prompt.
    pub fn therapist_note(&self, label: &str) -> String {
        match self {
            MatchMode::Receptive => {
                format!("Therapist note: learner selects picture of \"{label}\".")
            }
            MatchMode::Expressive => format!("Therapist note: correct label is \"{label}\"."),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Receptive => write!(f, "receptive"),
            MatchMode::Expressive => write!(f, "expressive"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "receptive" => Ok(MatchMode::Receptive),
            "expressive" => Ok(MatchMode::Expressive),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Running attempt counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub trials: u32,
    pub correct: u32,
    pub incorrect: u32,
}

impl Tally {
    /// Accuracy rounded to a whole percent; 0 before any attempt.
    pub fn accuracy_percent(&self) -> u32 {
        if self.trials == 0 {
            0
        } else {
            ((self.correct as f64 / self.trials as f64) * 100.0).round() as u32
        }
    }
}

/// Delayed transition after a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Start a fresh round.
    NextRound,
    /// Clear the highlight and present the same round again.
    Unlock,
}

/// Result of a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Options are locked (feedback showing); the click was ignored.
    Ignored,
    /// The selection was scored.
    Scored {
        correct: bool,
        target: String,
        pending: Pending<Transition>,
    },
}

/// Timing for feedback before the pending transition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackDelays {
    pub after_correct: Duration,
    pub after_error: Duration,
}

impl Default for FeedbackDelays {
    fn default() -> Self {
        Self {
            after_correct: Duration::from_millis(650),
            after_error: Duration::from_millis(900),
        }
    }
}

/// Configuration for a matching game.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub array_size: usize,
    pub mode: MatchMode,
    pub policy: CorrectionPolicy,
    pub delays: FeedbackDelays,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            array_size: 4,
            mode: MatchMode::Receptive,
            policy: CorrectionPolicy::RepeatOnError,
            delays: FeedbackDelays::default(),
        }
    }
}

/// State of one matching game. Owned by a single front end.
pub struct MatchingGame {
    id: String,
    items: Vec<Item>,
    config: MatchingConfig,
    current: Option<Trial>,
    locked: bool,
    generation: Generation,
    tally: Tally,
    log: Vec<String>,
}

impl MatchingGame {
    pub fn new(items: Vec<Item>, config: MatchingConfig) -> Result<Self, EngineError> {
        if config.array_size < 1 {
            return Err(EngineError::InvalidArraySize(config.array_size));
        }
        let items: Vec<Item> = items.into_iter().filter(Item::is_eligible).collect();
        if items.is_empty() {
            return Err(EngineError::EmptyPool);
        }
        Ok(Self {
            id: new_session_id(),
            items,
            config,
            current: None,
            locked: false,
            generation: Generation::default(),
            tally: Tally::default(),
            log: Vec::new(),
        })
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn current(&self) -> Option<&Trial> {
        self.current.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Prompt text for the current round.
    pub fn prompt(&self) -> Option<String> {
        self.current
            .as_ref()
            .map(|t| self.config.mode.prompt(&t.item_label))
    }

    /// Change the array size; takes effect on the next round.
    pub fn set_array_size(&mut self, array_size: usize) -> Result<(), EngineError> {
        if array_size < 1 {
            return Err(EngineError::InvalidArraySize(array_size));
        }
        self.config.array_size = array_size;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: MatchMode) {
        self.config.mode = mode;
    }

    /// Draw a new target and option array. Cancels any pending transition.
    pub fn new_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Trial, EngineError> {
        let target = self.items.choose(rng).ok_or(EngineError::EmptyPool)?;
        let trial = build_distractor_trial(target, &self.items, self.config.array_size, rng)?;
        tracing::debug!(target = %trial.item_id, options = trial.options.len(), "new round");

        self.generation.bump();
        self.locked = false;
        Ok(&*self.current.insert(trial))
    }

    /// Score a selection of `chosen_id` against the current target.
    pub fn select(&mut self, chosen_id: &str) -> Selection {
        let Some(trial) = self.current.as_ref() else {
            return Selection::Ignored;
        };
        if self.locked {
            return Selection::Ignored;
        }

        let target = trial.item_id.clone();
        let correct = chosen_id == target;
        self.tally.trials += 1;
        if correct {
            self.tally.correct += 1;
            self.log
                .push(format!("✅ Correct — Target: {target} | Chosen: {chosen_id}"));
        } else {
            self.tally.incorrect += 1;
            self.log
                .push(format!("❌ Incorrect — Target: {target} | Chosen: {chosen_id}"));
        }

        self.locked = true;
        self.generation.bump();
        let (kind, delay) = if self.config.policy.advances_after(correct) {
            let delay = if correct {
                self.config.delays.after_correct
            } else {
                self.config.delays.after_error
            };
            (Transition::NextRound, delay)
        } else {
            (Transition::Unlock, self.config.delays.after_error)
        };

        Selection::Scored {
            correct,
            target,
            pending: Pending {
                token: AdvanceToken::new(&self.id, self.generation),
                delay,
                kind,
            },
        }
    }

    /// Apply a delayed transition. Returns `false` when the token is stale.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        pending: &Pending<Transition>,
        rng: &mut R,
    ) -> Result<bool, EngineError> {
        if !pending.token.is_current(&self.id, self.generation) {
            tracing::debug!(generation = pending.token.generation, "stale transition ignored");
            return Ok(false);
        }
        match pending.kind {
            Transition::NextRound => {
                self.new_round(rng)?;
            }
            Transition::Unlock => {
                self.generation.bump();
                self.locked = false;
            }
        }
        Ok(true)
    }

    /// Clear counts and the attempt log.
    pub fn reset_tally(&mut self) {
        self.tally = Tally::default();
        self.log.clear();
    }
}
