//! Scored test results tracked across runs.
//!
//! Tests report numeric scores tagged by name. The [`scoring::ScoreSheet`]
//! keeps, for every (test, tag) pair, the current value, a short rolling
//! history and the best value seen so far, and compares the current run
//! against that best. The sheet is persisted as JSON between runs by the
//! [`session`] layer.

pub mod cli;
pub mod codec;
pub mod error;
pub mod report;
pub mod scoring;
pub mod session;
pub mod web;

pub use error::ScoreError;
pub use scoring::{Evaluator, ScoreResult, ScoreSheet, ScoreState};
pub use session::{ScoreSession, ScoreStore, SessionOptions};
