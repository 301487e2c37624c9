//! Ampel policy stubs generated from a Gemara Layer 2 control catalog.
//!
//! Every control becomes one policy, every assessment requirement one tenet.
//! Tenet evaluations are placeholders to be completed by a policy author.

pub mod mapper;

use serde::Serialize;

pub use mapper::{catalog_to_policy_files, convert_control, evaluation_template, PolicyFile};

/// Prefix of the `framework.catalog` reference.
pub const CATALOG_SCHEME: &str = "oscal://";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    /// All tenets must pass.
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AmpelPolicy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub logic: Logic,
    pub tenets: Vec<Tenet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<Framework>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Tenet {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub evaluation: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applicability: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Framework {
    pub catalog: String,
    pub control: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub requirement: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<FrameworkMapping>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameworkMapping {
    pub framework: String,
    pub control_id: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub strength: i64,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}
