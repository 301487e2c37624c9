//! Document Model
//!
//! A closed, immutable tree holding a parsed JSON or YAML input document.
//! Mappers only ever read it; every extraction site matches on [`Value`]
//! exhaustively instead of probing an open "any" type.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::DecodeError;

/// Object storage. Keys are unique; read order does not matter.
pub type Map = BTreeMap<String, Value>;

/// Numeric payload, kept in `serde_json`'s lossless representation.
pub type Number = serde_json::Number;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    /// Kind name used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Scalar text form: strings as-is, numbers and booleans via `to_string`.
    /// Containers and null have no scalar form.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Empty strings, arrays and objects, `false` and null are "empty".
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(_) => false,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = DecodeError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => yaml_number(&n),
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = Map::new();
                for (key, value) in mapping {
                    map.insert(yaml_key(key)?, Value::try_from(value)?);
                }
                Value::Object(map)
            }
            serde_yaml::Value::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, DecodeError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) => Err(DecodeError::UnsupportedKey { kind: "sequence" }),
        serde_yaml::Value::Mapping(_) => Err(DecodeError::UnsupportedKey { kind: "mapping" }),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

/// Textual format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
    /// Unknown extension: try JSON, then YAML.
    Auto,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => SourceFormat::Json,
            Some("yaml" | "yml") => SourceFormat::Yaml,
            _ => SourceFormat::Auto,
        }
    }
}

/// Parse raw bytes into a [`Value`].
pub fn parse(bytes: &[u8], format: SourceFormat) -> Result<Value, DecodeError> {
    match format {
        SourceFormat::Json => parse_json(bytes),
        SourceFormat::Yaml => parse_yaml(bytes),
        SourceFormat::Auto => match parse_json(bytes) {
            Ok(v) => Ok(v),
            Err(json_err) => parse_yaml(bytes).map_err(|yaml_err| DecodeError::Unrecognized {
                json: json_err.to_string(),
                yaml: yaml_err.to_string(),
            }),
        },
    }
}

pub fn parse_json(bytes: &[u8]) -> Result<Value, DecodeError> {
    let raw: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(Value::from(raw))
}

pub fn parse_yaml(bytes: &[u8]) -> Result<Value, DecodeError> {
    let raw: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    Value::try_from(raw)
}

/// Unwrap `{"<key>": {...}}` envelopes (e.g. OSCAL's `assessment-results`),
/// returning the document itself when it is not wrapped.
pub fn unwrap_root<'a>(root: &'a Value, key: &str) -> &'a Value {
    match root {
        Value::Object(map) => match map.get(key) {
            Some(inner @ Value::Object(_)) => inner,
            _ => root,
        },
        _ => root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_and_yaml_agree() {
        let json = parse_json(br#"{"a": [1, "x", true, null], "b": {"c": 2.5}}"#).unwrap();
        let yaml = parse_yaml(b"a: [1, x, true, ~]\nb:\n  c: 2.5\n").unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn test_yaml_scalar_keys_are_stringified() {
        let v = parse_yaml(b"1: one\ntrue: yes\n").unwrap();
        let map = v.as_object().unwrap();
        assert_eq!(map.get("1").and_then(Value::as_str), Some("one"));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_yaml_sequence_key_rejected() {
        let err = parse_yaml(b"? [a, b]\n: c\n").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedKey { kind: "sequence" }));
    }

    #[test]
    fn test_truncated_json_fails() {
        let err = parse(br#"{"results": [{"status": "PASS""#, SourceFormat::Json).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_auto_falls_back_to_yaml() {
        let v = parse(b"title: hello\n", SourceFormat::Auto).unwrap();
        assert_eq!(
            v.as_object().unwrap().get("title").and_then(Value::as_str),
            Some("hello")
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SourceFormat::from_path(Path::new("a.JSON")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("a.yml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a")), SourceFormat::Auto);
    }

    #[test]
    fn test_serialize_round_trips_through_json() {
        let v = parse_json(br#"{"k": [1, {"n": null}], "s": "t"}"#).unwrap();
        let text = serde_json::to_string(&v).unwrap();
        assert_eq!(text, r#"{"k":[1,{"n":null}],"s":"t"}"#);
    }

    #[test]
    fn test_unwrap_root() {
        let wrapped = parse_json(br#"{"catalog": {"metadata": {}}}"#).unwrap();
        let inner = unwrap_root(&wrapped, "catalog");
        assert!(inner.as_object().unwrap().contains_key("metadata"));

        let bare = parse_json(br#"{"metadata": {}}"#).unwrap();
        assert_eq!(unwrap_root(&bare, "catalog"), &bare);
    }
}
