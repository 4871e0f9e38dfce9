//! A scoring session: load the ledger, rotate it, take scores, save it.

mod runner;
mod store;
mod submission;

pub use runner::{run_command, CommandOutput};
pub use store::{decode_or_empty, ScoreStore, DEFAULT_SCORE_FILE};
pub use submission::{parse_submissions, ScoreSubmission, SCORE_LINE_PREFIX};

use crate::codec::{self, CodecError};
use crate::error::ScoreError;
use crate::scoring::{Evaluator, EvaluatorChanged, ScoreSheet, DEFAULT_HISTORY_LENGTH};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// Sheet ready for a new run: decoded from `bytes` (or empty) and rotated.
///
/// Results created during the run get `history_length`; loaded results keep
/// the length they were stored with.
pub fn start_sheet(bytes: Option<&[u8]>, history_length: usize) -> ScoreSheet {
    let mut sheet = decode_or_empty(bytes, history_length);
    sheet.set_history_length(history_length);
    sheet.rotate();
    sheet
}

/// Bytes to persist at the end of a run
pub fn finish_sheet(sheet: &ScoreSheet) -> Result<Vec<u8>, CodecError> {
    codec::to_vec(sheet)
}

/// Options controlling how a session starts and what it accepts
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Delete the stored ledger before loading it
    pub wipe: bool,
    /// Reject scores that have no cutoff
    pub strict: bool,
    /// History depth for results created in this session
    pub history_length: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            wipe: false,
            strict: false,
            history_length: DEFAULT_HISTORY_LENGTH,
        }
    }
}

/// A score that was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreFailure {
    pub test_name: String,
    pub tag: String,
    pub value: f64,
    pub error: ScoreError,
}

/// One run's worth of scoring against the persisted ledger
#[derive(Debug)]
pub struct ScoreSession {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    store: ScoreStore,
    sheet: ScoreSheet,
    strict: bool,
    failures: Vec<ScoreFailure>,
    advisories: Vec<EvaluatorChanged>,
}

impl ScoreSession {
    /// Load (or wipe) the ledger behind `store` and rotate it
    pub fn start(store: ScoreStore, options: &SessionOptions) -> Result<Self> {
        let session_id = Uuid::new_v4();
        info!("Starting score session {} with {:?}", session_id, store.path());

        if options.wipe {
            store.wipe()?;
        }
        let sheet = start_sheet(store.read().as_deref(), options.history_length);

        Ok(Self {
            session_id,
            started_at: Utc::now(),
            store,
            sheet,
            strict: options.strict,
            failures: Vec::new(),
            advisories: Vec::new(),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn sheet(&self) -> &ScoreSheet {
        &self.sheet
    }

    pub fn failures(&self) -> &[ScoreFailure] {
        &self.failures
    }

    pub fn advisories(&self) -> &[EvaluatorChanged] {
        &self.advisories
    }

    /// Record a score for `test_name`/`tag`.
    ///
    /// Errors are also kept in [`failures`](Self::failures) so the run can
    /// be judged as a whole at the end.
    pub fn submit_score(
        &mut self,
        value: f64,
        test_name: &str,
        tag: &str,
        less_is_better: bool,
        cutoff: Option<f64>,
    ) -> Result<(), ScoreError> {
        let outcome = if self.strict && cutoff.is_none() {
            Err(ScoreError::MissingCutoff {
                test_name: test_name.to_string(),
                tag: tag.to_string(),
            })
        } else {
            self.sheet
                .add_score(value, test_name, tag, Evaluator::new(less_is_better, cutoff))
        };

        match outcome {
            Ok(changed) => {
                self.advisories.extend(changed);
                Ok(())
            }
            Err(error) => {
                warn!("Score {}:{} = {} failed: {}", test_name, tag, value, error);
                self.failures.push(ScoreFailure {
                    test_name: test_name.to_string(),
                    tag: tag.to_string(),
                    value,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    pub fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), ScoreError> {
        self.submit_score(
            submission.value,
            &submission.test,
            &submission.tag,
            submission.less_is_better,
            submission.cutoff,
        )
    }

    /// Persist the ledger and hand back what happened in this session
    pub fn finish(self) -> Result<SessionSummary> {
        self.store.save(&self.sheet)?;
        let finished_at = Utc::now();
        info!(
            "Finished score session {} ({} scores, {} failures)",
            self.session_id,
            self.sheet.len(),
            self.failures.len()
        );

        Ok(SessionSummary {
            session_id: self.session_id,
            started_at: self.started_at,
            finished_at,
            sheet: self.sheet,
            failures: self.failures,
            advisories: self.advisories,
        })
    }
}

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sheet: ScoreSheet,
    pub failures: Vec<ScoreFailure>,
    pub advisories: Vec<EvaluatorChanged>,
}

impl SessionSummary {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}
