//! Engine and catalog error types.
//!
//! Configuration problems are recoverable (the learner stays on the setup
//! screen); catalog problems are fatal at startup.

use thiserror::Error;

/// Errors raised while configuring or running a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Start was requested with no deck selected.
    #[error("select at least one deck")]
    NoDeckSelected,

    /// Set size must be a positive integer.
    #[error("set size must be at least 1 (got {0})")]
    InvalidSetSize(usize),

    /// Matching arrays need room for at least the target.
    #[error("array size must be at least 1 (got {0})")]
    InvalidArraySize(usize),

    /// Nothing eligible survived the deck/id filters.
    #[error("no eligible items for the selected decks")]
    EmptyPool,

    /// "Start missed" was requested without a saved missed set.
    #[error("no saved missed set found")]
    NoMissedSet,

    /// A result or navigation targeted a trial that does not exist.
    #[error("trial index {index} out of range (session has {len} trials)")]
    OutOfRange { index: usize, len: usize },

    /// The controller was asked to do something its current phase forbids.
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
}

impl EngineError {
    /// Returns `true` for errors that should keep the user on the setup screen.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::NoDeckSelected
                | EngineError::InvalidSetSize(_)
                | EngineError::InvalidArraySize(_)
                | EngineError::EmptyPool
                | EngineError::NoMissedSet
        )
    }
}

/// Errors raised while loading the item catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(String),

    #[error("unsupported catalog format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),

    /// A record lacks `id`, `deck` or `label`.
    #[error("record {record}: each target must have id, deck, label (missing {field})")]
    MissingField { record: usize, field: &'static str },

    #[error("target {id} needs exemplars")]
    MissingExemplars { id: String },

    #[error("target {id} has unknown deck '{deck}'")]
    UnknownDeck { id: String, deck: String },

    #[error("duplicate target id: {0}")]
    DuplicateId(String),
}
