//! Correction policy and delayed-transition tokens.
//!
//! A front end that waits before advancing (feedback highlight, auto-advance
//! delay) holds an [`AdvanceToken`]. Anything that supersedes the pending
//! transition bumps the owner's [`Generation`], so a token applied late is
//! recognised as stale and ignored.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens after an incorrect response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionPolicy {
    /// Move on regardless of correctness.
    AlwaysAdvance,
    /// Show the correct answer, then present the same trial again.
    RepeatOnError,
}

impl CorrectionPolicy {
    /// Whether a response with this correctness moves to the next trial.
    pub fn advances_after(&self, correct: bool) -> bool {
        correct || matches!(self, CorrectionPolicy::AlwaysAdvance)
    }
}

impl fmt::Display for CorrectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionPolicy::AlwaysAdvance => write!(f, "always_advance"),
            CorrectionPolicy::RepeatOnError => write!(f, "repeat_on_error"),
        }
    }
}

impl FromStr for CorrectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "always_advance" | "advance" => Ok(CorrectionPolicy::AlwaysAdvance),
            "repeat_on_error" | "repeat" => Ok(CorrectionPolicy::RepeatOnError),
            other => Err(format!("unknown correction policy: {other}")),
        }
    }
}

/// Monotonic counter identifying the state a transition was scheduled against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    /// Invalidate every outstanding token.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identity of a pending delayed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceToken {
    pub session_id: String,
    pub generation: u64,
}

impl AdvanceToken {
    pub fn new(session_id: &str, generation: Generation) -> Self {
        Self {
            session_id: session_id.to_string(),
            generation: generation.value(),
        }
    }

    /// Whether the token still refers to the given owner state.
    pub fn is_current(&self, session_id: &str, generation: Generation) -> bool {
        self.session_id == session_id && self.generation == generation.value()
    }
}

/// A transition the front end should apply after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending<K> {
    pub token: AdvanceToken,
    pub delay: Duration,
    pub kind: K,
}
