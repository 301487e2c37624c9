use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use super::decode::decode_results;
use super::{
    Assessment, Context, Control, Evidence, EvaluationMetadata, EvaluationResult, Finding,
    FindingError, GemaraEvaluation, Identifier, PolicyRef, Status, Subject, EVALUATION_ID_PREFIX,
    EVALUATOR, EVALUATOR_VERSION, PASS_SUMMARY,
};
use crate::document::{Map, Value};
use crate::errors::DecodeError;
use crate::extract::{expect_object, get, get_digest_map, get_list, get_object, get_opt_str, get_str};

const DATE_START: [&str; 2] = ["date_start", "dateStart"];
const DATE_END: [&str; 2] = ["date_end", "dateEnd"];
const EVAL_RESULTS: [&str; 2] = ["eval_results", "evalResults"];
const ASSERT_MODE: [&str; 2] = ["assert_mode", "assertMode"];

const UNKNOWN_STATUS: &str = "UNKNOWN";
const DEFAULT_SUBJECT_NAME: &str = "unknown";
const SUBJECT_TYPE: &str = "artifact";
const DEFAULT_FRAMEWORK: &str = "custom";
const DEFAULT_EVIDENCE_TYPE: &str = "attestation";

/// Decode a result document and map every result it holds.
pub fn convert(root: &Value) -> Result<GemaraEvaluation, DecodeError> {
    let evaluations = decode_results(root)?
        .into_iter()
        .map(map_result)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(evaluations = evaluations.len(), "converted policy results");
    Ok(GemaraEvaluation::new(evaluations))
}

/// Map one Ampel `Result` object to a Layer 4 evaluation.
pub fn map_result(result: &Map) -> Result<EvaluationResult, DecodeError> {
    let empty = Map::new();
    let meta = get_object(result, "meta")?.unwrap_or(&empty);
    let policy = get_object(result, "policy")?.unwrap_or(&empty);

    let status = Status::from(get_str(result, "status", UNKNOWN_STATUS)?.as_str());
    let description = get_str(meta, "description", "")?;
    let eval_results = get_list(result, &EVAL_RESULTS)?;

    let date_start = parse_timestamp(get_opt_str(result, &DATE_START)?.as_deref());
    let date_end = parse_timestamp(get_opt_str(result, &DATE_END)?.as_deref());

    let summary = summarize(&status, &description, eval_results)?;

    let findings = eval_results
        .iter()
        .enumerate()
        .map(|(index, raw)| map_finding(expect_object(raw, "eval_results[]")?, index))
        .collect::<Result<Vec<_>, _>>()?;

    let context = match get_object(result, "context")? {
        Some(values) if !values.is_empty() => Some(Context {
            runtime: get_str(meta, "runtime", "")?,
            assert_mode: get_str(meta, &ASSERT_MODE, "")?,
            values: values.clone(),
        }),
        _ => None,
    };

    let subject = match get_object(result, "subject")? {
        Some(descriptor) => map_subject(descriptor)?,
        None => map_subject(&empty)?,
    };

    tracing::debug!(status = %status, findings = findings.len(), "mapped policy result");

    Ok(EvaluationResult {
        evaluation: EvaluationMetadata {
            id: evaluation_id(date_end.as_ref()),
            timestamp: date_end.as_ref().map(format_timestamp).unwrap_or_default(),
            duration_ms: duration_ms(date_start.as_ref(), date_end.as_ref()),
            evaluator: EVALUATOR.to_string(),
            evaluator_version: EVALUATOR_VERSION.to_string(),
        },
        subject,
        controls: map_controls(meta, &status)?,
        assessment: Assessment {
            status,
            summary,
        },
        policy: PolicyRef {
            id: get_str(policy, "id", "")?,
            version: get_str(policy, "version", "")?,
            description,
        },
        findings,
        context,
    })
}

/// The first non-PASS sub-result with an error message overrides the
/// description of a failed result.
fn summarize(status: &Status, description: &str, eval_results: &[Value]) -> Result<String, DecodeError> {
    if status.is_pass() {
        if description.is_empty() {
            return Ok(PASS_SUMMARY.to_string());
        }
        return Ok(description.to_string());
    }

    for raw in eval_results {
        let eval = expect_object(raw, "eval_results[]")?;
        if Status::from(get_str(eval, "status", UNKNOWN_STATUS)?.as_str()).is_pass() {
            continue;
        }
        if let Some(error) = get_object(eval, "error")? {
            if let Some(message) = get_opt_str(error, "message")? {
                return Ok(message);
            }
        }
        break;
    }
    Ok(description.to_string())
}

pub fn map_finding(eval: &Map, index: usize) -> Result<Finding, DecodeError> {
    let id = get_str(eval, "id", "")?;
    let status = Status::from(get_str(eval, "status", UNKNOWN_STATUS)?.as_str());

    let (description, error) = if status.is_pass() {
        let message = match get_object(eval, "assessment")? {
            Some(assessment) => get_str(assessment, "message", "")?,
            None => String::new(),
        };
        (message, None)
    } else {
        match get_object(eval, "error")? {
            Some(error) => {
                let message = get_str(error, "message", "")?;
                let remediation = get_str(error, "guidance", "")?;
                (
                    message.clone(),
                    Some(FindingError {
                        message,
                        remediation,
                    }),
                )
            }
            None => (String::new(), None),
        }
    };

    let outputs: BTreeMap<String, Value> = get_object(eval, "output")?
        .cloned()
        .unwrap_or_default();

    let evidence = get_list(eval, "statements")?
        .iter()
        .map(|raw| map_evidence(expect_object(raw, "statements[]")?))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Finding {
        id: if id.is_empty() {
            format!("check-{index}")
        } else {
            id
        },
        description,
        status,
        timestamp: parse_timestamp(get_opt_str(eval, "date")?.as_deref())
            .as_ref()
            .map(format_timestamp),
        error,
        outputs,
        evidence,
    })
}

fn map_evidence(statement: &Map) -> Result<Evidence, DecodeError> {
    let digest = match get(statement, "digest") {
        Some(Value::Object(_)) => get_digest_map(statement)?
            .into_iter()
            .next()
            .map(|(algorithm, value)| format!("{algorithm}:{value}"))
            .unwrap_or_default(),
        _ => get_str(statement, "digest", "")?,
    };
    Ok(Evidence {
        kind: get_str(statement, "type", DEFAULT_EVIDENCE_TYPE)?,
        digest,
    })
}

/// Controls inherit the overall result status.
pub fn map_controls(meta: &Map, status: &Status) -> Result<Vec<Control>, DecodeError> {
    get_list(meta, "controls")?
        .iter()
        .map(|raw| {
            let control = expect_object(raw, "controls[]")?;
            let framework = get_str(control, "class", "")?;
            Ok(Control {
                id: get_str(control, "id", "")?,
                framework: if framework.is_empty() {
                    DEFAULT_FRAMEWORK.to_string()
                } else {
                    framework
                },
                status: status.clone(),
            })
        })
        .collect()
}

/// Subject from an in-toto resource descriptor; identifiers follow algorithm
/// name order.
pub fn map_subject(descriptor: &Map) -> Result<Subject, DecodeError> {
    let name = get_str(descriptor, "name", "")?;
    let identifiers = get_digest_map(descriptor)?
        .into_iter()
        .map(|(kind, value)| Identifier { kind, value })
        .collect();
    Ok(Subject {
        name: if name.is_empty() {
            DEFAULT_SUBJECT_NAME.to_string()
        } else {
            name
        },
        kind: SUBJECT_TYPE.to_string(),
        identifiers,
    })
}

pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(value = raw, error = %e, "ignoring unparsable timestamp");
            None
        }
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Whole milliseconds between start and end, never negative.
pub fn duration_ms(start: Option<&DateTime<Utc>>, end: Option<&DateTime<Utc>>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => (*end - *start).num_milliseconds().max(0),
        _ => 0,
    }
}

pub fn evaluation_id(end: Option<&DateTime<Utc>>) -> String {
    match end {
        Some(end) => format!("{EVALUATION_ID_PREFIX}{}", end.format("%Y%m%d-%H%M%S")),
        None => format!("{EVALUATION_ID_PREFIX}unknown"),
    }
}
