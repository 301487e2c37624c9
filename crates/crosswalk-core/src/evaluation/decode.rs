//! Recognising Ampel result documents.
//!
//! Input may be a `ResultSet` (`{"results": [...]}`) or a single `Result`,
//! either bare or carried as the predicate of an in-toto statement. The
//! candidate schemas are tried in a fixed order and the first structural match
//! wins; when none matches the last candidate's error is reported.

use crate::document::{Map, Value};
use crate::errors::DecodeError;
use crate::extract::{expect_object, get, get_list, get_str};

/// Statement type prefix shared by in-toto v0.1 and v1 statements.
pub const IN_TOTO_STATEMENT_PREFIX: &str = "https://in-toto.io/Statement/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Multi-result batch: a non-empty `results` array.
    ResultSet,
    /// One result: an object carrying `status` or `policy`.
    SingleResult,
}

impl Candidate {
    /// Decoders in the order they are attempted.
    pub const ORDER: [Candidate; 2] = [Candidate::ResultSet, Candidate::SingleResult];

    pub fn name(self) -> &'static str {
        match self {
            Candidate::ResultSet => "result set",
            Candidate::SingleResult => "single result",
        }
    }

    pub fn decode(self, payload: &Value) -> Result<Vec<&Map>, DecodeError> {
        let obj = expect_object(payload, "predicate")?;
        match self {
            Candidate::ResultSet => {
                if get(obj, "results").is_none() {
                    return Err(DecodeError::Schema(
                        "not a result set: missing `results`".to_string(),
                    ));
                }
                let results = get_list(obj, "results")?;
                if results.is_empty() {
                    return Err(DecodeError::Schema(
                        "result set contains no results".to_string(),
                    ));
                }
                results
                    .iter()
                    .map(|r| expect_object(r, "results[]"))
                    .collect()
            }
            Candidate::SingleResult => {
                if get(obj, "status").is_none() && get(obj, "policy").is_none() {
                    return Err(DecodeError::Schema(
                        "not a policy result: missing `status` and `policy`".to_string(),
                    ));
                }
                Ok(vec![obj])
            }
        }
    }
}

/// Strip an in-toto statement (or a raw `predicateType`/`predicate` pair)
/// down to its predicate.
pub fn unwrap_envelope(root: &Value) -> Result<&Value, DecodeError> {
    let Some(obj) = root.as_object() else {
        return Ok(root);
    };
    let statement_type = get_str(obj, "_type", "")?;
    let is_statement = statement_type.starts_with(IN_TOTO_STATEMENT_PREFIX);
    if is_statement || (get(obj, "predicateType").is_some() && get(obj, "predicate").is_some()) {
        return get(obj, "predicate").ok_or_else(|| {
            DecodeError::Schema("in-toto statement has no predicate".to_string())
        });
    }
    Ok(root)
}

/// Locate the result records of a document.
pub fn decode_results(root: &Value) -> Result<Vec<&Map>, DecodeError> {
    let payload = unwrap_envelope(root)?;
    let mut last_error = None;
    for candidate in Candidate::ORDER {
        match candidate.decode(payload) {
            Ok(results) => {
                tracing::debug!(
                    candidate = candidate.name(),
                    results = results.len(),
                    "decoded policy results"
                );
                return Ok(results);
            }
            Err(e) => {
                tracing::debug!(candidate = candidate.name(), error = %e, "candidate rejected");
                last_error = Some(e);
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| DecodeError::Schema("no result decoder configured".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_json;

    #[test]
    fn test_result_set_wins_first() {
        let doc = parse_json(br#"{"results": [{"status": "PASS"}, {"status": "FAIL"}], "status": "FAIL"}"#).unwrap();
        assert_eq!(decode_results(&doc).unwrap().len(), 2);
    }

    #[test]
    fn test_single_result_fallback() {
        let doc = parse_json(br#"{"status": "PASS", "policy": {"id": "p"}}"#).unwrap();
        let results = decode_results(&doc).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].contains_key("policy"));
    }

    #[test]
    fn test_empty_result_set_falls_through() {
        let doc = parse_json(br#"{"results": []}"#).unwrap();
        let err = decode_results(&doc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "not a policy result: missing `status` and `policy`"
        );
    }

    #[test]
    fn test_in_toto_statement_unwrapped() {
        let doc = parse_json(
            br#"{"_type": "https://in-toto.io/Statement/v1",
                 "predicateType": "https://carabiner.dev/ampel/resultset/v0",
                 "predicate": {"results": [{"status": "PASS"}]}}"#,
        )
        .unwrap();
        assert_eq!(decode_results(&doc).unwrap().len(), 1);
    }

    #[test]
    fn test_raw_predicate_pair_unwrapped() {
        let doc = parse_json(br#"{"predicateType": "x", "predicate": {"status": "FAIL"}}"#).unwrap();
        assert_eq!(decode_results(&doc).unwrap().len(), 1);
    }

    #[test]
    fn test_statement_without_predicate() {
        let doc = parse_json(br#"{"_type": "https://in-toto.io/Statement/v1"}"#).unwrap();
        assert!(decode_results(&doc).is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        let doc = parse_json(br#"[1, 2]"#).unwrap();
        let err = decode_results(&doc).unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { .. }));
    }
}
