use super::evaluator::{Evaluator, ScoreState};
use super::result::{ScoreResult, DEFAULT_HISTORY_LENGTH};
use crate::error::ScoreError;
use serde::Serialize;
use tracing::{debug, warn};

/// Column headers of the report table
pub const REPORT_HEADER: [&str; 4] = ["Test name", "Current", "Last", "Best"];

/// Scores recorded for one test, in insertion order of their tags
#[derive(Debug, Clone, PartialEq)]
struct TestScores {
    test_name: String,
    tags: Vec<(String, ScoreResult)>,
}

/// Ledger of all scores, keyed by test name and tag.
///
/// Tests and tags keep the order in which they were first seen, so reports
/// come out in a stable order across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    scores: Vec<TestScores>,
    history_length: usize,
}

impl Default for ScoreSheet {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LENGTH)
    }
}

/// Advisory raised when a score arrives with a different evaluator than the
/// one stored for its key. The stored evaluator has already been replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorChanged {
    pub test_name: String,
    pub tag: String,
    pub previous: Evaluator,
    pub current: Evaluator,
}

/// One row of the flattened report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// `test_name:tag`
    pub label: String,
    pub current: Option<f64>,
    pub last: Option<f64>,
    pub best: Option<f64>,
}

/// Flattened, read-only view of a sheet for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub header: [&'static str; 4],
    pub rows: Vec<ReportRow>,
    pub states: Vec<ScoreState>,
}

impl ReportView {
    pub fn iter(&self) -> impl Iterator<Item = (&ReportRow, ScoreState)> {
        self.rows.iter().zip(self.states.iter().copied())
    }
}

impl ScoreSheet {
    /// Empty sheet whose new results keep `history_length` past values
    pub fn new(history_length: usize) -> Self {
        Self {
            scores: Vec::new(),
            history_length,
        }
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// Number of (test, tag) pairs
    pub fn len(&self) -> usize {
        self.scores.iter().map(|t| t.tags.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, test_name: &str, tag: &str) -> Option<&ScoreResult> {
        self.scores
            .iter()
            .find(|t| t.test_name == test_name)?
            .tags
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, result)| result)
    }

    /// All results as `(test_name, tag, result)`, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ScoreResult)> {
        self.scores.iter().flat_map(|t| {
            t.tags
                .iter()
                .map(move |(tag, result)| (t.test_name.as_str(), tag.as_str(), result))
        })
    }

    /// Test names with their tag results, in insertion order
    pub(crate) fn tests(&self) -> impl Iterator<Item = (&str, &[(String, ScoreResult)])> {
        self.scores
            .iter()
            .map(|t| (t.test_name.as_str(), t.tags.as_slice()))
    }

    fn test_tags(&mut self, test_name: &str) -> &mut Vec<(String, ScoreResult)> {
        let test_idx = match self.scores.iter().position(|t| t.test_name == test_name) {
            Some(idx) => idx,
            None => {
                self.scores.push(TestScores {
                    test_name: test_name.to_string(),
                    tags: Vec::new(),
                });
                self.scores.len() - 1
            }
        };
        &mut self.scores[test_idx].tags
    }

    fn entry(&mut self, test_name: &str, tag: &str, evaluator: Evaluator) -> &mut ScoreResult {
        let history_length = self.history_length;
        let tags = self.test_tags(test_name);
        let tag_idx = match tags.iter().position(|(t, _)| t == tag) {
            Some(idx) => idx,
            None => {
                tags.push((tag.to_string(), ScoreResult::new(evaluator, history_length)));
                tags.len() - 1
            }
        };
        &mut tags[tag_idx].1
    }

    /// Put a restored result under its key, replacing any existing one
    pub(crate) fn insert(&mut self, test_name: &str, tag: &str, result: ScoreResult) {
        let tags = self.test_tags(test_name);
        match tags.iter().position(|(t, _)| t == tag) {
            Some(idx) => tags[idx].1 = result,
            None => tags.push((tag.to_string(), result)),
        }
    }

    /// History depth given to results created from now on. Results already
    /// on the sheet keep their own.
    pub fn set_history_length(&mut self, history_length: usize) {
        self.history_length = history_length;
    }

    /// Record `value` for the given test and tag.
    ///
    /// A second score for the same key in one run is rejected before
    /// anything on the stored result changes. If the key already exists
    /// with a different evaluator, the evaluator is replaced and the change
    /// is returned as an advisory; the score is recorded either way. Best
    /// values are recomputed under the new evaluator at the next rotation,
    /// including history measured under the old one.
    pub fn add_score(
        &mut self,
        value: f64,
        test_name: &str,
        tag: &str,
        evaluator: Evaluator,
    ) -> Result<Option<EvaluatorChanged>, ScoreError> {
        let result = self.entry(test_name, tag, evaluator);
        if result.current().is_some() {
            return Err(ScoreError::DuplicateScore {
                test_name: test_name.to_string(),
                tag: tag.to_string(),
            });
        }

        let mut changed = None;
        if result.evaluator != evaluator {
            warn!("Evaluator for score {}:{} changed", test_name, tag);
            changed = Some(EvaluatorChanged {
                test_name: test_name.to_string(),
                tag: tag.to_string(),
                previous: result.evaluator,
                current: evaluator,
            });
            result.set_evaluator(evaluator);
        }

        result.add_score(value)?;
        Ok(changed)
    }

    /// Prepare the sheet for a new run.
    ///
    /// Must be called exactly once per run, before any score is added;
    /// a second call shifts the history again.
    pub fn rotate(&mut self) {
        for test in &mut self.scores {
            for (_, result) in &mut test.tags {
                result.rotate();
            }
        }
        debug!(results = self.len(), "rotated score sheet");
    }

    pub fn create_report_view(&self) -> ReportView {
        let (rows, states) = self
            .iter()
            .map(|(test_name, tag, result)| {
                let row = ReportRow {
                    label: format!("{}:{}", test_name, tag),
                    current: result.current(),
                    last: result.last(),
                    best: result.best(),
                };
                (row, result.get_state())
            })
            .unzip();
        ReportView {
            header: REPORT_HEADER,
            rows,
            states,
        }
    }
}
