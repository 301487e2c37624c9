//! Ampel PolicySet templates from a Gemara Layer 3 policy document.
//!
//! Each modification a policy applies to a referenced guidance document or
//! control catalog becomes one Ampel policy with a single placeholder tenet.
//! The generated CEL code is scaffolding only.

pub mod mapper;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::document::{Map, Value};

pub use mapper::convert;

pub const DEFAULT_POLICYSET_ID: &str = "gemara-policy";
pub const DEFAULT_POLICYSET_VERSION: &str = "1.0.0";
pub const POLICY_VERSION: &str = "v1.0.0";
pub const CEL_RUNTIME: &str = "cel@v14.0";
pub const SOURCE_NOTE: &str = "Converted from Gemara Layer 3 Policy";

pub const IN_TOTO_STATEMENT_V1: &str = "https://in-toto.io/Statement/v1";
pub const SLSA_PROVENANCE_V1: &str = "https://slsa.dev/provenance/v1";

/// Suffix replacing the input extension when no output path is given.
pub const OUTPUT_SUFFIX: &str = ".ampel.json";

#[derive(Debug, Clone, Copy)]
pub struct PolicySetOptions {
    /// Recorded as `meta.converted-at`.
    pub converted_at: DateTime<Utc>,
}

impl PolicySetOptions {
    pub fn now() -> Self {
        Self {
            converted_at: Utc::now(),
        }
    }
}

/// `policy.yaml` → `policy.ampel.json` in the same directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "policy".to_string());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}"))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PolicySet {
    pub id: String,
    pub version: String,
    pub meta: PolicySetMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common: Option<Common>,
    pub policies: Vec<Policy>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PolicySetMeta {
    pub description: String,
    pub source: String,
    pub organization_id: String,
    pub converted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_plan: Option<Map>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Common {
    pub context: BTreeMap<String, ContextValue>,
}

/// A context parameter declared from a scope dimension.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub default: Value,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Policy {
    pub id: String,
    pub version: String,
    pub meta: PolicyMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, ContextValue>>,
    pub tenets: Vec<PolicyTenet>,
    pub predicates: Predicates,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PolicyMeta {
    Modification(ModificationMeta),
    Template { description: String, note: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ModificationMeta {
    pub description: String,
    pub reference_id: String,
    pub target_id: String,
    pub modification_type: String,
    pub modification_rationale: String,
    pub mapping_type: MappingType,
    pub category: Category,
}

/// Which kind of reference a modification came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    Guidance,
    Control,
}

/// What a modification targets.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Control,
    Assessment,
    Guideline,
}

impl Category {
    /// Modification list keys of a policy mapping, in processing order.
    pub const ALL: [(Category, &'static str); 3] = [
        (Category::Control, "control-modifications"),
        (Category::Assessment, "assessment-requirement-modifications"),
        (Category::Guideline, "guideline-modifications"),
    ];
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PolicyTenet {
    pub runtime: String,
    pub code: String,
    pub outputs: BTreeMap<String, OutputCode>,
    pub assessment: TenetMessage,
    pub error: TenetError,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutputCode {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TenetMessage {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TenetError {
    pub message: String,
    pub guidance: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Predicates {
    pub types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("policies/org.yaml")),
            PathBuf::from("policies/org.ampel.json")
        );
        assert_eq!(
            default_output_path(Path::new("org")),
            PathBuf::from("org.ampel.json")
        );
    }
}
