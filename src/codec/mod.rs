//! JSON codec for the score ledger.
//!
//! Every ledger object is wrapped in a single-key envelope naming its kind:
//!
//! ```json
//! {"score-sheet": {"history_length": 5, "scores": {"mod/test": {"": {"score-result": {...}}}}}}
//! ```
//!
//! Decoding works bottom-up. An object holding exactly one envelope key is
//! rebuilt into the matching ledger object from that key's field
//! dictionary; any other value passes through untouched. Extra keys next to
//! an envelope key are ignored. Envelope keys are assumed never to appear in
//! user data, test names and tags included, which is also why a result keeps
//! its evaluator under `policy`.

use crate::scoring::{Evaluator, ScoreResult, ScoreSheet};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

pub const SCORE_SHEET_KEY: &str = "score-sheet";
pub const SCORE_RESULT_KEY: &str = "score-result";
pub const EVALUATOR_KEY: &str = "evaluator";

/// Kinds of ledger objects carried in an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    ScoreSheet,
    ScoreResult,
    Evaluator,
}

impl Kind {
    pub fn key(&self) -> &'static str {
        match self {
            Kind::ScoreSheet => SCORE_SHEET_KEY,
            Kind::ScoreResult => SCORE_RESULT_KEY,
            Kind::Evaluator => EVALUATOR_KEY,
        }
    }

    pub fn from_key(key: &str) -> Option<Kind> {
        match key {
            SCORE_SHEET_KEY => Some(Kind::ScoreSheet),
            SCORE_RESULT_KEY => Some(Kind::ScoreResult),
            EVALUATOR_KEY => Some(Kind::Evaluator),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors while reading a persisted ledger
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to parse score data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} envelope does not hold a field dictionary")]
    NotAnObject { kind: Kind },

    #[error("{kind} is missing field '{field}'")]
    MissingField { kind: Kind, field: &'static str },

    #[error("{kind} field '{field}' has an invalid value: {found}")]
    InvalidField {
        kind: Kind,
        field: &'static str,
        found: String,
    },

    #[error("expected {expected}, found {found}")]
    UnexpectedKind { expected: Kind, found: String },

    #[error("object carries more than one envelope key ({first}, {second})")]
    AmbiguousEnvelope { first: Kind, second: Kind },

    #[error("top-level value is not a score sheet (found {found})")]
    NotASheet { found: String },
}

/// A borrowed ledger object ready to be encoded
#[derive(Debug, Clone, Copy)]
pub enum Encodable<'a> {
    ScoreSheet(&'a ScoreSheet),
    ScoreResult(&'a ScoreResult),
    Evaluator(&'a Evaluator),
}

/// Wrap an object's field dictionary in its envelope
pub fn encode(obj: Encodable<'_>) -> Value {
    let (kind, fields) = match obj {
        Encodable::ScoreSheet(sheet) => (Kind::ScoreSheet, sheet_fields(sheet)),
        Encodable::ScoreResult(result) => (Kind::ScoreResult, result_fields(result)),
        Encodable::Evaluator(evaluator) => (Kind::Evaluator, evaluator_fields(evaluator)),
    };
    let mut envelope = Map::new();
    envelope.insert(kind.key().to_string(), fields);
    Value::Object(envelope)
}

fn sheet_fields(sheet: &ScoreSheet) -> Value {
    let mut scores = Map::new();
    for (test_name, tags) in sheet.tests() {
        let mut by_tag = Map::new();
        for (tag, result) in tags {
            by_tag.insert(tag.clone(), encode(Encodable::ScoreResult(result)));
        }
        scores.insert(test_name.to_string(), Value::Object(by_tag));
    }
    json!({
        "scores": scores,
        "history_length": sheet.history_length(),
    })
}

fn result_fields(result: &ScoreResult) -> Value {
    json!({
        "best": result.best(),
        "current": result.current(),
        "history": result.history().collect::<Vec<_>>(),
        "history_length": result.history_length(),
        "policy": encode(Encodable::Evaluator(result.evaluator())),
    })
}

fn evaluator_fields(evaluator: &Evaluator) -> Value {
    let mut fields = Map::new();
    fields.insert("less_is_better".to_string(), json!(evaluator.less_is_better()));
    if let Some(cutoff) = evaluator.cutoff() {
        fields.insert("cutoff".to_string(), json!(cutoff));
    }
    Value::Object(fields)
}

/// A decoded JSON tree in which envelopes have been turned into ledger
/// objects
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    ScoreSheet(ScoreSheet),
    ScoreResult(ScoreResult),
    Evaluator(Evaluator),
    Object(Vec<(String, Decoded)>),
    Array(Vec<Decoded>),
    Scalar(Value),
}

impl Decoded {
    fn describe(&self) -> String {
        match self {
            Decoded::ScoreSheet(_) => SCORE_SHEET_KEY.to_string(),
            Decoded::ScoreResult(_) => SCORE_RESULT_KEY.to_string(),
            Decoded::Evaluator(_) => EVALUATOR_KEY.to_string(),
            Decoded::Object(_) => "object".to_string(),
            Decoded::Array(_) => "array".to_string(),
            Decoded::Scalar(Value::Null) => "null".to_string(),
            Decoded::Scalar(v) => v.to_string(),
        }
    }
}

/// Decode a JSON tree, rebuilding every envelope it contains
pub fn decode(value: Value) -> Result<Decoded, CodecError> {
    match value {
        Value::Array(items) => Ok(Decoded::Array(
            items.into_iter().map(decode).collect::<Result<_, _>>()?,
        )),
        Value::Object(map) => {
            let mut fields = map
                .into_iter()
                .map(|(key, value)| decode(value).map(|decoded| (key, decoded)))
                .collect::<Result<Vec<_>, _>>()?;

            let markers: Vec<(usize, Kind)> = fields
                .iter()
                .enumerate()
                .filter_map(|(idx, (key, _))| Kind::from_key(key).map(|kind| (idx, kind)))
                .collect();

            match markers.as_slice() {
                [] => Ok(Decoded::Object(fields)),
                [(idx, kind)] => {
                    let (_, inner) = fields.swap_remove(*idx);
                    rebuild(*kind, inner)
                }
                [(_, first), (_, second), ..] => Err(CodecError::AmbiguousEnvelope {
                    first: *first,
                    second: *second,
                }),
            }
        }
        scalar => Ok(Decoded::Scalar(scalar)),
    }
}

fn rebuild(kind: Kind, inner: Decoded) -> Result<Decoded, CodecError> {
    let Decoded::Object(fields) = inner else {
        return Err(CodecError::NotAnObject { kind });
    };
    let mut fields = Fields { kind, fields };
    Ok(match kind {
        Kind::ScoreSheet => Decoded::ScoreSheet(rebuild_sheet(&mut fields)?),
        Kind::ScoreResult => Decoded::ScoreResult(rebuild_result(&mut fields)?),
        Kind::Evaluator => Decoded::Evaluator(rebuild_evaluator(&mut fields)?),
    })
}

fn rebuild_sheet(fields: &mut Fields) -> Result<ScoreSheet, CodecError> {
    let history_length = fields.length("history_length")?;
    let tests = match fields.required("scores")? {
        Decoded::Object(tests) => tests,
        other => return Err(fields.invalid("scores", other.describe())),
    };

    let mut sheet = ScoreSheet::new(history_length);
    for (test_name, tags) in tests {
        let tags = match tags {
            Decoded::Object(tags) => tags,
            other => return Err(fields.invalid("scores", other.describe())),
        };
        for (tag, result) in tags {
            match result {
                Decoded::ScoreResult(result) => sheet.insert(&test_name, &tag, result),
                other => {
                    return Err(CodecError::UnexpectedKind {
                        expected: Kind::ScoreResult,
                        found: other.describe(),
                    })
                }
            }
        }
    }
    Ok(sheet)
}

fn rebuild_result(fields: &mut Fields) -> Result<ScoreResult, CodecError> {
    let evaluator = match fields.required("policy")? {
        Decoded::Evaluator(evaluator) => evaluator,
        other => {
            return Err(CodecError::UnexpectedKind {
                expected: Kind::Evaluator,
                found: other.describe(),
            })
        }
    };
    let history_length = fields.length("history_length")?;
    let history = match fields.required("history")? {
        Decoded::Array(items) => items
            .into_iter()
            .map(|item| optional_number(&item).ok_or_else(|| fields.invalid("history", item.describe())))
            .collect::<Result<Vec<_>, _>>()?,
        other => return Err(fields.invalid("history", other.describe())),
    };
    let current = fields.optional_number("current")?;
    let best = fields.optional_number("best")?;

    Ok(ScoreResult::from_parts(
        evaluator,
        history_length,
        history,
        current,
        best,
    ))
}

fn rebuild_evaluator(fields: &mut Fields) -> Result<Evaluator, CodecError> {
    let less_is_better = match fields.required("less_is_better")? {
        Decoded::Scalar(Value::Bool(flag)) => flag,
        other => return Err(fields.invalid("less_is_better", other.describe())),
    };
    let cutoff = match fields.take("cutoff") {
        Some(value) => optional_number(&value).ok_or_else(|| fields.invalid("cutoff", value.describe()))?,
        None => None,
    };
    Ok(Evaluator::new(less_is_better, cutoff))
}

/// `Some(None)` for null, `Some(Some(n))` for a number, `None` otherwise
fn optional_number(value: &Decoded) -> Option<Option<f64>> {
    match value {
        Decoded::Scalar(Value::Null) => Some(None),
        Decoded::Scalar(Value::Number(n)) => n.as_f64().map(Some),
        _ => None,
    }
}

/// Field dictionary of one envelope, consumed as it is rebuilt
struct Fields {
    kind: Kind,
    fields: Vec<(String, Decoded)>,
}

impl Fields {
    fn take(&mut self, name: &str) -> Option<Decoded> {
        let idx = self.fields.iter().position(|(key, _)| key == name)?;
        Some(self.fields.swap_remove(idx).1)
    }

    fn required(&mut self, name: &'static str) -> Result<Decoded, CodecError> {
        self.take(name).ok_or(CodecError::MissingField {
            kind: self.kind,
            field: name,
        })
    }

    fn optional_number(&mut self, name: &'static str) -> Result<Option<f64>, CodecError> {
        let value = self.required(name)?;
        optional_number(&value).ok_or_else(|| self.invalid(name, value.describe()))
    }

    fn length(&mut self, name: &'static str) -> Result<usize, CodecError> {
        match self.required(name)? {
            Decoded::Scalar(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| self.invalid(name, n.to_string())),
            other => Err(self.invalid(name, other.describe())),
        }
    }

    fn invalid(&self, field: &'static str, found: impl Into<String>) -> CodecError {
        CodecError::InvalidField {
            kind: self.kind,
            field,
            found: found.into(),
        }
    }
}

/// Serialize a sheet to JSON bytes
pub fn to_vec(sheet: &ScoreSheet) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec_pretty(&encode(Encodable::ScoreSheet(sheet)))?)
}

/// Parse JSON bytes into a sheet. Fails unless the top-level value is a
/// score sheet envelope.
pub fn from_slice(bytes: &[u8]) -> Result<ScoreSheet, CodecError> {
    let value: Value = serde_json::from_slice(bytes)?;
    match decode(value)? {
        Decoded::ScoreSheet(sheet) => Ok(sheet),
        other => Err(CodecError::NotASheet {
            found: other.describe(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> ScoreSheet {
        let mut sheet = ScoreSheet::new(3);
        sheet
            .add_score(3.1, "mod/test_a", "", Evaluator::new(false, None))
            .unwrap();
        sheet
            .add_score(0.25, "mod/test_a", "latency", Evaluator::new(true, Some(0.5)))
            .unwrap();
        sheet.rotate();
        sheet
            .add_score(4.0, "mod/test_a", "", Evaluator::new(false, None))
            .unwrap();
        sheet
            .add_score(12.0, "mod/test_b", "size", Evaluator::new(false, Some(10.0)))
            .unwrap();
        // latency and size skip this run, leaving gaps in their history
        sheet.rotate();
        sheet
            .add_score(5.0, "mod/test_a", "", Evaluator::new(false, None))
            .unwrap();
        sheet.rotate();
        sheet.set_history_length(7);
        sheet
            .add_score(1.5, "mod/test_c", "", Evaluator::new(true, None))
            .unwrap();
        sheet
    }

    #[test]
    fn test_envelope_shape() {
        let value = encode(Encodable::Evaluator(&Evaluator::new(true, Some(2.0))));
        assert_eq!(
            value,
            json!({"evaluator": {"less_is_better": true, "cutoff": 2.0}})
        );

        let value = encode(Encodable::Evaluator(&Evaluator::new(false, None)));
        assert_eq!(value, json!({"evaluator": {"less_is_better": false}}));
    }

    #[test]
    fn test_result_envelope_shape() {
        let mut result = ScoreResult::new(Evaluator::default(), 5);
        result.add_score(1.5).unwrap();
        result.rotate();
        let value = encode(Encodable::ScoreResult(&result));
        assert_eq!(
            value,
            json!({"score-result": {
                "best": 1.5,
                "current": null,
                "history": [1.5],
                "history_length": 5,
                "policy": {"evaluator": {"less_is_better": false}},
            }})
        );
    }

    #[test]
    fn test_round_trip() {
        let sheet = sample_sheet();
        let bytes = to_vec(&sheet).unwrap();
        let decoded = from_slice(&bytes).unwrap();
        assert_eq!(decoded, sheet);

        let labels: Vec<_> = decoded
            .iter()
            .map(|(test, tag, _)| format!("{}:{}", test, tag))
            .collect();
        assert_eq!(
            labels,
            vec!["mod/test_a:", "mod/test_a:latency", "mod/test_b:size", "mod/test_c:"]
        );
    }

    #[test]
    fn test_round_trip_keeps_gaps_and_lengths() {
        let sheet = sample_sheet();
        let decoded = from_slice(&to_vec(&sheet).unwrap()).unwrap();
        assert_eq!(decoded, sheet);

        let latency = decoded.get("mod/test_a", "latency").unwrap();
        assert_eq!(
            latency.history().collect::<Vec<_>>(),
            vec![None, None, Some(0.25)]
        );
        assert_eq!(latency.last(), None);
        assert_eq!(latency.history_length(), 3);
        assert_eq!(decoded.get("mod/test_c", "").unwrap().history_length(), 7);
        assert_eq!(decoded.history_length(), 7);
    }

    #[test]
    fn test_huge_history_length_decodes() {
        let bytes = br#"{"score-sheet": {"scores": {"t": {"": {"score-result": {
            "policy": {"evaluator": {"less_is_better": false}},
            "current": null, "best": 2.0, "history": [2.0],
            "history_length": 1152921504606846976
        }}}}, "history_length": 1152921504606846976}}"#;
        let sheet = from_slice(bytes).unwrap();
        assert_eq!(sheet.history_length(), 1152921504606846976);
        let result = sheet.get("t", "").unwrap();
        assert_eq!(result.history().collect::<Vec<_>>(), vec![Some(2.0)]);
    }

    #[test]
    fn test_round_trip_empty() {
        let sheet = ScoreSheet::default();
        let decoded = from_slice(&to_vec(&sheet).unwrap()).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded, sheet);
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let value = json!({
            "score-sheet": {"scores": {}, "history_length": 4, "version": "future"},
            "comment": "written by hand",
        });
        match decode(value).unwrap() {
            Decoded::ScoreSheet(sheet) => assert_eq!(sheet.history_length(), 4),
            other => panic!("expected sheet, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_values_pass_through() {
        let value = json!({"foo": [1, {"bar": null}]});
        assert_eq!(
            decode(value).unwrap(),
            Decoded::Object(vec![(
                "foo".to_string(),
                Decoded::Array(vec![
                    Decoded::Scalar(json!(1)),
                    Decoded::Object(vec![("bar".to_string(), Decoded::Scalar(Value::Null))]),
                ])
            )])
        );
    }

    #[test]
    fn test_nested_envelope_outside_sheet() {
        let value = json!([{"evaluator": {"less_is_better": true}}]);
        assert_eq!(
            decode(value).unwrap(),
            Decoded::Array(vec![Decoded::Evaluator(Evaluator::new(true, None))])
        );
    }

    #[test]
    fn test_foreign_shapes_are_not_sheets() {
        assert!(matches!(
            from_slice(br#"{"foo": 1}"#),
            Err(CodecError::NotASheet { .. })
        ));
        assert!(matches!(
            from_slice(br#"{"evaluator": {"less_is_better": false}}"#),
            Err(CodecError::NotASheet { .. })
        ));
        assert!(matches!(from_slice(b"not json at all"), Err(CodecError::Json(_))));
        let bytes = to_vec(&sample_sheet()).unwrap();
        assert!(from_slice(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn test_missing_field_fails() {
        let value = json!({"score-result": {"best": 1.0, "current": null, "history": [], "history_length": 5}});
        assert!(matches!(
            decode(value),
            Err(CodecError::MissingField {
                kind: Kind::ScoreResult,
                field: "policy"
            })
        ));
    }

    #[test]
    fn test_wrong_kind_in_scores_fails() {
        let value = json!({"score-sheet": {
            "scores": {"t": {"": {"evaluator": {"less_is_better": false}}}},
            "history_length": 5,
        }});
        assert!(matches!(
            decode(value),
            Err(CodecError::UnexpectedKind {
                expected: Kind::ScoreResult,
                ..
            })
        ));
    }

    #[test]
    fn test_two_envelope_keys_fail() {
        let value = json!({
            "evaluator": {"less_is_better": false},
            "score-sheet": {"scores": {}, "history_length": 5},
        });
        assert!(matches!(decode(value), Err(CodecError::AmbiguousEnvelope { .. })));
    }

    #[test]
    fn test_invalid_history_entry_fails() {
        let value = json!({"score-result": {
            "best": null,
            "current": null,
            "history": ["three"],
            "history_length": 5,
            "policy": {"evaluator": {"less_is_better": false}},
        }});
        assert!(matches!(
            decode(value),
            Err(CodecError::InvalidField { field: "history", .. })
        ));
    }

    #[test]
    fn test_nan_is_stored_as_null() {
        let mut sheet = ScoreSheet::default();
        sheet
            .add_score(f64::NAN, "t", "", Evaluator::default())
            .unwrap();
        let decoded = from_slice(&to_vec(&sheet).unwrap()).unwrap();
        assert_eq!(decoded.get("t", "").unwrap().current(), None);
    }
}
