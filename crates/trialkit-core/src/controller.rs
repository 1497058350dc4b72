//! Drill controller: the `Idle → Configuring → Running → Summary` state machine.
//!
//! The controller owns the active [`Session`] and is the only thing that
//! mutates it. Delayed auto-advance is handed back to the front end as a
//! [`Pending`] token that goes stale when navigation, ending or restarting
//! supersedes it.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::advance::{AdvanceToken, CorrectionPolicy, Generation, Pending};
use crate::catalog::build_pool;
use crate::engine::{build_trials, expand_items, TrialConfig};
use crate::error::EngineError;
use crate::model::{Deck, Item, Outcome};
use crate::session::{Session, SessionConfig, Step};
use crate::statistics::{compute_summary, Summary};

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Configuring,
    Running,
    Summary,
}

impl Phase {
    fn describe(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Configuring => "configuring",
            Phase::Running => "running",
            Phase::Summary => "showing the summary",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Everything the setup screen collects.
#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    pub client: String,
    pub decks: Vec<Deck>,
    pub trials: TrialConfig,
    /// Restrict the pool to a saved missed set and use all of it.
    pub missed_ids: Option<Vec<String>>,
}

/// The only delayed transition the drill schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoAdvance;

/// What a response did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Cursor moved immediately (or the session finished).
    Advanced(Step),
    /// The same trial stays up for another attempt.
    Repeat,
    /// Advance after the returned delay unless superseded first.
    Scheduled(Pending<AutoAdvance>),
}

/// Owns the active drill session and enforces phase transitions.
pub struct DrillController {
    items: Vec<Item>,
    policy: CorrectionPolicy,
    advance_delay: Duration,
    phase: Phase,
    session: Option<Session>,
    generation: Generation,
}

impl DrillController {
    pub fn new(items: Vec<Item>, policy: CorrectionPolicy) -> Self {
        Self {
            items,
            policy,
            advance_delay: Duration::ZERO,
            phase: Phase::Idle,
            session: None,
            generation: Generation::default(),
        }
    }

    /// Wait this long before auto-advancing (zero advances immediately).
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    fn require(&self, phase: Phase, action: &'static str) -> Result<(), EngineError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                action,
                state: self.phase.describe(),
            })
        }
    }

    fn supersede(&mut self) {
        self.generation.bump();
    }

    /// Idle or Summary → Configuring.
    pub fn open_setup(&mut self) -> Result<(), EngineError> {
        match self.phase {
            Phase::Idle | Phase::Configuring => {
                self.phase = Phase::Configuring;
                Ok(())
            }
            Phase::Summary => self.restart(),
            Phase::Running => Err(EngineError::InvalidState {
                action: "open setup",
                state: self.phase.describe(),
            }),
        }
    }

    /// Configuring → Running. On error the controller stays in Configuring.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        request: StartRequest,
        rng: &mut R,
    ) -> Result<&Session, EngineError> {
        self.require(Phase::Configuring, "start a session")?;
        if request.decks.is_empty() {
            return Err(EngineError::NoDeckSelected);
        }
        if request.trials.set_size < 1 {
            return Err(EngineError::InvalidSetSize(request.trials.set_size));
        }

        let from_missed_set = request.missed_ids.is_some();
        let trials = match &request.missed_ids {
            Some(ids) => {
                if ids.is_empty() {
                    return Err(EngineError::NoMissedSet);
                }
                let pool = build_pool(&self.items, &request.decks, Some(ids.as_slice()));
                if pool.is_empty() {
                    return Err(EngineError::EmptyPool);
                }
                expand_items(&pool, &request.trials, rng)
            }
            None => {
                let pool = build_pool(&self.items, &request.decks, None);
                build_trials(&pool, &request.trials, rng)?
            }
        };

        let config = SessionConfig {
            trials: request.trials,
            decks: request.decks,
            from_missed_set,
        };
        let session = Session::new(&request.client, config, trials);
        tracing::info!(
            session = %session.session_id,
            trials = session.len(),
            from_missed_set,
            "session started"
        );

        self.supersede();
        self.phase = Phase::Running;
        Ok(&*self.session.insert(session))
    }

    fn running_session(&mut self, action: &'static str) -> Result<&mut Session, EngineError> {
        self.require(Phase::Running, action)?;
        self.session.as_mut().ok_or(EngineError::InvalidState {
            action,
            state: "without a session",
        })
    }

    fn after_step(&mut self, step: Step) -> Step {
        if step == Step::Finished {
            self.phase = Phase::Summary;
        }
        step
    }

    /// Score the trial under the cursor and apply the correction policy.
    pub fn respond(&mut self, outcome: Outcome, at: DateTime<Utc>) -> Result<Response, EngineError> {
        let policy = self.policy;
        let delay = self.advance_delay;
        let session = self.running_session("respond")?;
        let cursor = session.cursor;
        session.record_result(cursor, outcome, at)?;
        let session_id = session.session_id.clone();

        if !policy.advances_after(outcome.is_correct()) {
            self.supersede();
            return Ok(Response::Repeat);
        }
        if delay.is_zero() {
            let step = self.running_session("advance")?.next();
            self.supersede();
            return Ok(Response::Advanced(self.after_step(step)));
        }

        self.supersede();
        Ok(Response::Scheduled(Pending {
            token: AdvanceToken::new(&session_id, self.generation),
            delay,
            kind: AutoAdvance,
        }))
    }

    /// Apply a scheduled auto-advance. Returns `None` for a stale token.
    pub fn apply_advance(&mut self, pending: &Pending<AutoAdvance>) -> Option<Step> {
        let current = self.phase == Phase::Running
            && self
                .session
                .as_ref()
                .is_some_and(|s| pending.token.is_current(&s.session_id, self.generation));
        if !current {
            tracing::debug!(generation = pending.token.generation, "stale auto-advance ignored");
            return None;
        }
        let step = self.session.as_mut()?.next();
        self.supersede();
        Some(self.after_step(step))
    }

    /// Record against an explicit trial position without moving the cursor.
    ///
    /// Out-of-range positions are logged and ignored.
    pub fn record_at(&mut self, index: usize, outcome: Outcome, at: DateTime<Utc>) -> bool {
        let Ok(session) = self.running_session("record") else {
            return false;
        };
        match session.record_result(index, outcome, at) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("ignoring result: {e}");
                false
            }
        }
    }

    /// Move forward without scoring.
    pub fn next(&mut self) -> Result<Step, EngineError> {
        let step = self.running_session("go to the next trial")?.next();
        self.supersede();
        Ok(self.after_step(step))
    }

    /// Move back without scoring.
    pub fn back(&mut self) -> Result<Step, EngineError> {
        let step = self.running_session("go back")?.back();
        self.supersede();
        Ok(step)
    }

    /// Running → Summary on explicit request.
    pub fn end(&mut self) -> Result<Summary, EngineError> {
        self.running_session("end the session")?.finish();
        self.supersede();
        self.phase = Phase::Summary;
        self.summary().ok_or(EngineError::InvalidState {
            action: "summarize",
            state: "without a session",
        })
    }

    /// Summary of the current (or just finished) session.
    pub fn summary(&self) -> Option<Summary> {
        self.session.as_ref().map(compute_summary)
    }

    /// Summary → Configuring, discarding the session.
    pub fn restart(&mut self) -> Result<(), EngineError> {
        self.require(Phase::Summary, "restart")?;
        self.session = None;
        self.supersede();
        self.phase = Phase::Configuring;
        Ok(())
    }
}
