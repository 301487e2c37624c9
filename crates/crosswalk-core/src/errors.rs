//! Error types for reading, mapping and writing compliance records.

use std::path::PathBuf;
use thiserror::Error;

use crate::render::template::TemplateError;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// A document could not be interpreted as the expected structure.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Neither JSON nor YAML parsing succeeded for a file without a known extension.
    #[error("not valid JSON ({json}) or YAML ({yaml})")]
    Unrecognized { json: String, yaml: String },

    /// A YAML mapping used a sequence or mapping as a key.
    #[error("unsupported mapping key of kind {kind}")]
    UnsupportedKey { kind: &'static str },

    /// A field holds a value of the wrong container kind.
    #[error("field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The document does not match any recognised schema.
    #[error("{0}")]
    Schema(String),
}

impl DecodeError {
    pub fn mismatch(field: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        DecodeError::TypeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }
}

/// Errors that abort a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl ConvertError {
    /// Process exit code reported by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Read { .. } => 2,
            Self::Decode(_) => 3,
            Self::Write { .. } => 4,
            Self::Template(_) => 5,
            Self::Serialize(_) => 1,
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Serialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConvertError {
    fn from(err: serde_yaml::Error) -> Self {
        ConvertError::Serialize(err.to_string())
    }
}
