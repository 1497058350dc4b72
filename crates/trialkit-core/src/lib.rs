//! trialkit-core — trial generation, sessions and scoring.
//!
//! This crate defines the item model, the trial engine, the drill session
//! and its controller, the matching game, and summary statistics. It has no
//! rendering or storage concerns; callers own the RNG and the clock.

pub mod advance;
pub mod catalog;
pub mod controller;
pub mod engine;
pub mod error;
pub mod matching;
pub mod model;
pub mod session;
pub mod statistics;

pub use error::{CatalogError, EngineError};
