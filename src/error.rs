//! Failures that cross from the ledger into the test runner.

use thiserror::Error;

/// Errors raised while recording a score.
///
/// Both ledger-core variants are reported back to the runner as the failure
/// reason of the scored test. Persistence problems never show up here; the
/// store recovers from them by starting over with an empty ledger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// The same (test, tag) pair was scored twice without a rotation in between.
    #[error("cannot assign a score for test '{test_name}' and tag '{tag}' twice")]
    DuplicateScore { test_name: String, tag: String },

    /// A score failed its configured cutoff.
    #[error("score {value} does not satisfy cutoff ({value} {op} {cutoff})", op = comparison(.less_is_better))]
    ThresholdViolation {
        value: f64,
        cutoff: f64,
        less_is_better: bool,
    },

    /// Strict mode rejects scores that carry no cutoff.
    #[error("score for test '{test_name}' and tag '{tag}' has no cutoff (strict mode)")]
    MissingCutoff { test_name: String, tag: String },
}

fn comparison(less_is_better: &bool) -> &'static str {
    if *less_is_better {
        "<="
    } else {
        ">="
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_message_carries_value_and_cutoff() {
        let err = ScoreError::ThresholdViolation {
            value: 4.0,
            cutoff: 5.0,
            less_is_better: false,
        };
        let msg = err.to_string();
        assert!(msg.contains("4"));
        assert!(msg.contains(">= 5"));
    }

    #[test]
    fn test_threshold_message_less_is_better() {
        let err = ScoreError::ThresholdViolation {
            value: 2.5,
            cutoff: 1.0,
            less_is_better: true,
        };
        assert!(err.to_string().contains("2.5 <= 1"));
    }
}
