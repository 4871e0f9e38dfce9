use super::evaluator::{Evaluator, ScoreState};
use crate::error::ScoreError;
use std::collections::VecDeque;
use tracing::debug;

/// Default number of past values kept per (test, tag) pair
pub const DEFAULT_HISTORY_LENGTH: usize = 5;

/// Score state of a single (test, tag) pair.
///
/// `current` is only set between a submission and the next rotation. The
/// history is newest first and never grows past `history_length`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub(crate) current: Option<f64>,
    pub(crate) best: Option<f64>,
    pub(crate) history: VecDeque<Option<f64>>,
    pub(crate) history_length: usize,
    pub(crate) evaluator: Evaluator,
}

impl ScoreResult {
    pub fn new(evaluator: Evaluator, history_length: usize) -> Self {
        Self {
            current: None,
            best: None,
            history: VecDeque::new(),
            history_length,
            evaluator,
        }
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn history(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.history.iter().copied()
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Most recent history entry
    pub fn last(&self) -> Option<f64> {
        self.history.front().copied().flatten()
    }

    pub(crate) fn set_evaluator(&mut self, evaluator: Evaluator) {
        self.evaluator = evaluator;
    }

    /// Record the value for this run, then check it against the cutoff.
    ///
    /// The value stays recorded even if the cutoff check fails.
    pub fn add_score(&mut self, value: f64) -> Result<(), ScoreError> {
        if self.current.is_some() {
            return Err(ScoreError::DuplicateScore {
                test_name: String::new(),
                tag: String::new(),
            });
        }
        self.current = Some(value);
        self.evaluator.assert_sufficient(value)
    }

    /// Prepare for a new run: recompute the best value, then move the
    /// current value into the history.
    pub fn rotate(&mut self) {
        self.evaluate_best();
        self.flush_current();
    }

    pub fn evaluate_best(&mut self) {
        let candidates = [self.current, self.best]
            .into_iter()
            .chain(self.history.iter().copied());
        self.best = self.evaluator.evaluate_best(candidates);
    }

    pub fn flush_current(&mut self) {
        if self.history_length == 0 {
            self.current = None;
            return;
        }
        while self.history.len() >= self.history_length {
            self.history.pop_back();
        }
        self.history.push_front(self.current.take());
        debug!(history = self.history.len(), "flushed current score");
    }

    pub fn get_state(&self) -> ScoreState {
        self.evaluator.get_state(self.current, self.best)
    }

    /// Restore a result from persisted parts, truncating an over-long history
    pub(crate) fn from_parts(
        evaluator: Evaluator,
        history_length: usize,
        history: Vec<Option<f64>>,
        current: Option<f64>,
        best: Option<f64>,
    ) -> Self {
        let mut history: VecDeque<Option<f64>> = history.into();
        history.truncate(history_length);
        Self {
            current,
            best,
            history,
            history_length,
            evaluator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(result: &ScoreResult) -> Vec<Option<f64>> {
        result.history().collect()
    }

    #[test]
    fn test_add_score_twice_fails() {
        let mut result = ScoreResult::new(Evaluator::default(), DEFAULT_HISTORY_LENGTH);
        result.add_score(1.0).unwrap();
        assert!(matches!(
            result.add_score(2.0),
            Err(ScoreError::DuplicateScore { .. })
        ));
        assert_eq!(result.current(), Some(1.0));
    }

    #[test]
    fn test_add_score_below_cutoff_still_records() {
        let mut result = ScoreResult::new(Evaluator::new(false, Some(5.0)), DEFAULT_HISTORY_LENGTH);
        assert!(matches!(
            result.add_score(4.0),
            Err(ScoreError::ThresholdViolation { .. })
        ));
        assert_eq!(result.current(), Some(4.0));
    }

    #[test]
    fn test_rotate_moves_current_into_history() {
        let mut result = ScoreResult::new(Evaluator::default(), DEFAULT_HISTORY_LENGTH);
        result.add_score(3.1).unwrap();
        result.rotate();
        assert_eq!(result.current(), None);
        assert_eq!(result.best(), Some(3.1));
        assert_eq!(result.last(), Some(3.1));
        assert_eq!(history_of(&result), vec![Some(3.1)]);
    }

    #[test]
    fn test_best_is_max_over_runs() {
        let values = [2.0, 7.5, -1.0, 7.0, 3.0, 0.5, 1.0, 6.0];
        let mut result = ScoreResult::new(Evaluator::default(), 3);
        for v in values {
            result.add_score(v).unwrap();
            result.rotate();
        }
        // 7.5 was evicted from the history long ago, but best remembers it
        assert_eq!(result.best(), Some(7.5));
    }

    #[test]
    fn test_best_is_min_when_less_is_better() {
        let mut result = ScoreResult::new(Evaluator::new(true, None), 2);
        for v in [4.0, 1.0, 9.0, 8.0, 7.0] {
            result.add_score(v).unwrap();
            result.rotate();
        }
        assert_eq!(result.best(), Some(1.0));
    }

    #[test]
    fn test_huge_history_length_does_not_allocate_up_front() {
        let mut result = ScoreResult::new(Evaluator::default(), usize::MAX);
        result.add_score(1.0).unwrap();
        result.rotate();
        assert_eq!(history_of(&result), vec![Some(1.0)]);
    }

    #[test]
    fn test_history_evicts_oldest_first() {
        let mut result = ScoreResult::new(Evaluator::default(), 5);
        for v in 1..=6 {
            result.add_score(v as f64).unwrap();
            result.rotate();
            assert!(result.history().count() <= 5);
        }
        assert_eq!(
            history_of(&result),
            vec![Some(6.0), Some(5.0), Some(4.0), Some(3.0), Some(2.0)]
        );
    }

    #[test]
    fn test_rotate_without_score_records_gap() {
        let mut result = ScoreResult::new(Evaluator::default(), DEFAULT_HISTORY_LENGTH);
        result.add_score(2.0).unwrap();
        result.rotate();
        result.rotate();
        assert_eq!(history_of(&result), vec![None, Some(2.0)]);
        assert_eq!(result.last(), None);
        assert_eq!(result.best(), Some(2.0));
    }

    #[test]
    fn test_zero_history_length() {
        let mut result = ScoreResult::new(Evaluator::default(), 0);
        result.add_score(2.0).unwrap();
        result.rotate();
        assert_eq!(result.history().count(), 0);
        assert_eq!(result.best(), Some(2.0));
        assert_eq!(result.current(), None);
    }

    #[test]
    fn test_get_state_against_previous_best() {
        let mut result = ScoreResult::new(Evaluator::default(), DEFAULT_HISTORY_LENGTH);
        result.add_score(2.0).unwrap();
        result.rotate();
        assert_eq!(result.get_state(), ScoreState::Unknown);
        result.add_score(3.0).unwrap();
        assert_eq!(result.get_state(), ScoreState::Better);
    }

    #[test]
    fn test_from_parts_truncates_history() {
        let result = ScoreResult::from_parts(
            Evaluator::default(),
            2,
            vec![Some(1.0), Some(2.0), Some(3.0)],
            None,
            Some(3.0),
        );
        assert_eq!(history_of(&result), vec![Some(1.0), Some(2.0)]);
    }
}
