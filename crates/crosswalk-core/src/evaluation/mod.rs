//! Gemara Layer 4 evaluations from Ampel policy-evaluation results.

pub mod decode;
pub mod mapper;

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::document::Value;

pub use decode::{decode_results, Candidate};
pub use mapper::{convert, map_result};

pub const GEMARA_VERSION: &str = "1.0";
pub const EVALUATION_LAYER: u8 = 4;
pub const EVALUATOR: &str = "ampel";
pub const EVALUATOR_VERSION: &str = "1.0";
pub const EVALUATION_ID_PREFIX: &str = "ampel-eval-";

/// Summary of a passing result that carries no description of its own.
pub const PASS_SUMMARY: &str = "All policy tenets validated successfully";

/// Status of a policy result or an individual tenet check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
    Error,
    Skip,
    SoftFail,
    /// Any other status string, kept verbatim (`UNKNOWN` when absent).
    Other(String),
}

impl Status {
    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
            Status::Skip => "SKIP",
            Status::SoftFail => "SOFTFAIL",
            Status::Other(s) => s,
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        match s {
            "PASS" => Status::Pass,
            "FAIL" => Status::Fail,
            "ERROR" => Status::Error,
            "SKIP" => Status::Skip,
            "SOFTFAIL" => Status::SoftFail,
            other => Status::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Gemara Layer 4 document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GemaraEvaluation {
    pub gemara_version: String,
    pub layer: u8,
    #[serde(rename = "type")]
    pub kind: String,
    pub evaluations: Vec<EvaluationResult>,
}

impl GemaraEvaluation {
    pub fn new(evaluations: Vec<EvaluationResult>) -> Self {
        Self {
            gemara_version: GEMARA_VERSION.to_string(),
            layer: EVALUATION_LAYER,
            kind: "evaluation".to_string(),
            evaluations,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationResult {
    pub evaluation: EvaluationMetadata,
    pub subject: Subject,
    pub assessment: Assessment,
    pub policy: PolicyRef,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<Control>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationMetadata {
    pub id: String,
    pub timestamp: String,
    pub duration_ms: i64,
    pub evaluator: String,
    pub evaluator_version: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Subject {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub identifiers: Vec<Identifier>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Assessment {
    pub status: Status,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PolicyRef {
    pub id: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Control {
    pub id: String,
    pub framework: String,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Finding {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FindingError>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FindingError {
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remediation: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub digest: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Context {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub runtime: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub assert_mode: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, Value>,
}
