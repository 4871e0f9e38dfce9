use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// State of the current score versus the best score so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreState {
    Unknown,
    Unchanged,
    Better,
    Worse,
}

impl fmt::Display for ScoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreState::Unknown => write!(f, "unknown"),
            ScoreState::Unchanged => write!(f, "unchanged"),
            ScoreState::Better => write!(f, "better"),
            ScoreState::Worse => write!(f, "worse"),
        }
    }
}

/// Comparison policy for score values: which direction is better, and an
/// optional cutoff every submitted value has to meet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Evaluator {
    less_is_better: bool,
    cutoff: Option<f64>,
}

impl Evaluator {
    pub fn new(less_is_better: bool, cutoff: Option<f64>) -> Self {
        Self {
            less_is_better,
            cutoff,
        }
    }

    pub fn less_is_better(&self) -> bool {
        self.less_is_better
    }

    pub fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    /// Ordering of `a` against `b` in terms of quality: `Greater` means `a`
    /// is the better value. `None` if the values cannot be compared (NaN).
    fn quality_cmp(&self, a: f64, b: f64) -> Option<Ordering> {
        let ord = a.partial_cmp(&b)?;
        Some(if self.less_is_better { ord.reverse() } else { ord })
    }

    fn better_than(&self, a: f64, b: f64) -> bool {
        self.quality_cmp(a, b) == Some(Ordering::Greater)
    }

    fn better_or_equal(&self, a: f64, b: f64) -> bool {
        matches!(
            self.quality_cmp(a, b),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }

    /// Best of the given values. Absent and NaN values are skipped; returns
    /// `None` if nothing is left.
    pub fn evaluate_best<I>(&self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .fold(None, |best, v| match best {
                Some(b) if !self.better_than(v, b) => Some(b),
                _ => Some(v),
            })
    }

    /// Fails with [`ScoreError::ThresholdViolation`] if a cutoff is set and
    /// `value` does not reach it.
    pub fn assert_sufficient(&self, value: f64) -> Result<(), ScoreError> {
        match self.cutoff {
            Some(cutoff) if !self.better_or_equal(value, cutoff) => {
                Err(ScoreError::ThresholdViolation {
                    value,
                    cutoff,
                    less_is_better: self.less_is_better,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn get_state(&self, current: Option<f64>, best: Option<f64>) -> ScoreState {
        let (Some(current), Some(best)) = (current, best) else {
            return ScoreState::Unknown;
        };
        match self.quality_cmp(current, best) {
            Some(Ordering::Greater) => ScoreState::Better,
            Some(Ordering::Less) => ScoreState::Worse,
            Some(Ordering::Equal) => ScoreState::Unchanged,
            None => ScoreState::Unknown,
        }
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.less_is_better {
            "less is better"
        } else {
            "more is better"
        };
        match self.cutoff {
            Some(cutoff) => write!(f, "{}, cutoff {}", direction, cutoff),
            None => write!(f, "{}, no cutoff", direction),
        }
    }
}
