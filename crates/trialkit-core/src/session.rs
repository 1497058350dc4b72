//! A single drill run: trials, cursor and the position-keyed result log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::TrialConfig;
use crate::error::EngineError;
use crate::model::{Deck, Outcome, ResultRecord, Trial};

/// Configuration snapshot taken when the session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub trials: TrialConfig,
    pub decks: Vec<Deck>,
    /// Whether the pool was seeded from a saved missed set.
    #[serde(default)]
    pub from_missed_set: bool,
}

/// Where the cursor ended up after a response or navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Cursor moved to another trial.
    Moved,
    /// Cursor did not move.
    Stayed,
    /// The last trial was passed; the session is over.
    Finished,
}

/// A drill session, exclusively owned by whoever drives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub client: String,
    pub created_at: DateTime<Utc>,
    pub config: SessionConfig,
    pub trials: Vec<Trial>,
    /// Index of the trial being presented.
    pub cursor: usize,
    /// One slot per trial; `None` means not answered.
    results: Vec<Option<ResultRecord>>,
    #[serde(default)]
    finished: bool,
}

/// Generate a session identifier (`sess_` followed by 32 hex digits).
pub fn new_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

impl Session {
    pub fn new(client: &str, config: SessionConfig, trials: Vec<Trial>) -> Self {
        let results = vec![None; trials.len()];
        Self {
            session_id: new_session_id(),
            client: client.trim().to_string(),
            created_at: Utc::now(),
            config,
            trials,
            cursor: 0,
            results,
            finished: false,
        }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.trials.is_empty()
    }

    /// The trial under the cursor, if the session is still running.
    pub fn current_trial(&self) -> Option<&Trial> {
        if self.finished {
            return None;
        }
        self.trials.get(self.cursor)
    }

    /// The result stored for a trial position.
    pub fn result_at(&self, index: usize) -> Option<&ResultRecord> {
        self.results.get(index).and_then(Option::as_ref)
    }

    /// Answered records in trial order.
    pub fn answered(&self) -> impl Iterator<Item = &ResultRecord> {
        self.results.iter().flatten()
    }

    pub fn answered_count(&self) -> usize {
        self.answered().count()
    }

    /// Insert or overwrite the result at `index`. Never moves the cursor.
    pub fn record_result(
        &mut self,
        index: usize,
        outcome: Outcome,
        at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let trial = self.trials.get(index).ok_or(EngineError::OutOfRange {
            index,
            len: self.trials.len(),
        })?;
        let record = ResultRecord::new(index, trial, outcome, at);
        self.results[index] = Some(record);
        Ok(())
    }

    /// Score the current trial and auto-advance.
    pub fn respond(&mut self, outcome: Outcome, at: DateTime<Utc>) -> Result<Step, EngineError> {
        if self.finished {
            return Err(EngineError::OutOfRange {
                index: self.cursor,
                len: self.trials.len(),
            });
        }
        self.record_result(self.cursor, outcome, at)?;
        Ok(self.next())
    }

    /// Move forward without scoring; passing the last trial finishes the session.
    pub fn next(&mut self) -> Step {
        if self.finished {
            return Step::Finished;
        }
        if self.cursor + 1 < self.trials.len() {
            self.cursor += 1;
            Step::Moved
        } else {
            self.finish();
            Step::Finished
        }
    }

    /// Move back without scoring; a no-op on the first trial.
    pub fn back(&mut self) -> Step {
        if self.finished || self.cursor == 0 {
            return Step::Stayed;
        }
        self.cursor -= 1;
        Step::Moved
    }

    /// End the session early.
    pub fn finish(&mut self) {
        if !self.finished {
            tracing::info!(
                session = %self.session_id,
                answered = self.answered_count(),
                trials = self.trials.len(),
                "session finished"
            );
        }
        self.finished = true;
    }
}
