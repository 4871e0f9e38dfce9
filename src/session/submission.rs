//! Score submissions as reported by a test run

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Prefix marking score lines in the output of a test command
pub const SCORE_LINE_PREFIX: &str = "SCORE ";

/// A single score reported by a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    /// Test identifier, e.g. `module/test_name`
    pub test: String,
    /// Sub-label distinguishing several scores of one test
    #[serde(default)]
    pub tag: String,
    pub value: f64,
    #[serde(default)]
    pub less_is_better: bool,
    #[serde(default)]
    pub cutoff: Option<f64>,
}

/// Parse score submissions, one JSON object per line.
///
/// With a `prefix`, only lines starting with it are considered and the prefix
/// is stripped; everything else is ordinary test output. Malformed lines are
/// skipped with a warning.
pub fn parse_submissions(text: &str, prefix: Option<&str>) -> Vec<ScoreSubmission> {
    let mut submissions = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        let payload = match prefix {
            Some(prefix) => match line.strip_prefix(prefix) {
                Some(rest) => rest.trim(),
                None => continue,
            },
            None => line,
        };
        if payload.is_empty() {
            continue;
        }

        match serde_json::from_str::<ScoreSubmission>(payload) {
            Ok(submission) => submissions.push(submission),
            Err(e) => warn!("Skipping malformed score on line {}: {}", lineno + 1, e),
        }
    }

    submissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_lines() {
        let text = r#"
{"test": "mod/test_a", "value": 3.1}
{"test": "mod/test_a", "tag": "latency", "value": 0.2, "less_is_better": true, "cutoff": 0.5}
"#;
        let subs = parse_submissions(text, None);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].tag, "");
        assert!(!subs[0].less_is_better);
        assert_eq!(subs[0].cutoff, None);
        assert_eq!(subs[1].tag, "latency");
        assert_eq!(subs[1].cutoff, Some(0.5));
    }

    #[test]
    fn test_parse_prefixed_output() {
        let text = "running 2 tests\n\
                    SCORE {\"test\": \"t\", \"value\": 1}\n\
                    test t ... ok\n\
                    SCORE not json\n\
                    test result: ok. 2 passed; 0 failed\n";
        let subs = parse_submissions(text, Some(SCORE_LINE_PREFIX));
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].test, "t");
        assert_eq!(subs[0].value, 1.0);
    }

    #[test]
    fn test_missing_value_is_skipped() {
        let subs = parse_submissions(r#"{"test": "t"}"#, None);
        assert!(subs.is_empty());
    }
}
