//! Field Extractor
//!
//! Typed reads over the Document Model. Optional data is the norm: a missing
//! field (or an explicit null) yields the caller's default. Only a value of the
//! wrong container kind is a hard failure.

use std::collections::BTreeMap;

use crate::document::{Map, Value};
use crate::errors::DecodeError;

/// A field name, or an ordered list of alias names where the first present
/// one wins (e.g. protojson's `date_end` / `dateEnd`).
pub trait FieldKey {
    fn lookup<'a>(&self, obj: &'a Map) -> Option<&'a Value>;
    fn label(&self) -> String;
}

impl FieldKey for str {
    fn lookup<'a>(&self, obj: &'a Map) -> Option<&'a Value> {
        obj.get(self).filter(|v| !v.is_null())
    }

    fn label(&self) -> String {
        self.to_string()
    }
}

impl<const N: usize> FieldKey for [&str; N] {
    fn lookup<'a>(&self, obj: &'a Map) -> Option<&'a Value> {
        self.iter().find_map(|k| k.lookup(obj))
    }

    fn label(&self) -> String {
        self.first().map(|k| k.to_string()).unwrap_or_default()
    }
}

pub fn get<'a, K: FieldKey + ?Sized>(obj: &'a Map, key: &K) -> Option<&'a Value> {
    key.lookup(obj)
}

/// Read a scalar as text. Absent → `default`; containers are a type mismatch.
pub fn get_str<K: FieldKey + ?Sized>(
    obj: &Map,
    key: &K,
    default: &str,
) -> Result<String, DecodeError> {
    match get(obj, key) {
        None => Ok(default.to_string()),
        Some(v) => v
            .scalar_text()
            .ok_or_else(|| DecodeError::mismatch(key.label(), "string", v.kind())),
    }
}

/// Like [`get_str`] but distinguishes absence from an empty default.
pub fn get_opt_str<K: FieldKey + ?Sized>(
    obj: &Map,
    key: &K,
) -> Result<Option<String>, DecodeError> {
    match get(obj, key) {
        None => Ok(None),
        Some(v) => v
            .scalar_text()
            .map(Some)
            .ok_or_else(|| DecodeError::mismatch(key.label(), "string", v.kind())),
    }
}

/// Read a list. Absent → empty slice.
pub fn get_list<'a, K: FieldKey + ?Sized>(
    obj: &'a Map,
    key: &K,
) -> Result<&'a [Value], DecodeError> {
    match get(obj, key) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(v) => Err(DecodeError::mismatch(key.label(), "array", v.kind())),
    }
}

/// Read a nested object. Absent → `None`.
pub fn get_object<'a, K: FieldKey + ?Sized>(
    obj: &'a Map,
    key: &K,
) -> Result<Option<&'a Map>, DecodeError> {
    match get(obj, key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(v) => Err(DecodeError::mismatch(key.label(), "object", v.kind())),
    }
}

/// Read a list of scalar strings. Absent → empty.
pub fn get_string_list<K: FieldKey + ?Sized>(
    obj: &Map,
    key: &K,
) -> Result<Vec<String>, DecodeError> {
    get_list(obj, key)?
        .iter()
        .map(|item| {
            item.scalar_text()
                .ok_or_else(|| DecodeError::mismatch(key.label(), "string items", item.kind()))
        })
        .collect()
}

/// Require that a value (a root document or a list item) is an object.
pub fn expect_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::mismatch(what, "object", value.kind()))
}

/// Digest map of an in-toto resource descriptor: `{"digest": {"sha256": "…"}}`.
pub fn get_digest_map(descriptor: &Map) -> Result<BTreeMap<String, String>, DecodeError> {
    let Some(digest) = get_object(descriptor, "digest")? else {
        return Ok(BTreeMap::new());
    };
    digest
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(algorithm, v)| {
            v.scalar_text()
                .map(|hex| (algorithm.clone(), hex))
                .ok_or_else(|| DecodeError::mismatch(format!("digest.{algorithm}"), "string", v.kind()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_json;

    fn obj(json: &str) -> Map {
        parse_json(json.as_bytes())
            .unwrap()
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_get_str_defaults_and_scalars() {
        let o = obj(r#"{"name": "a", "n": 3, "b": false, "z": null}"#);
        assert_eq!(get_str(&o, "name", "x").unwrap(), "a");
        assert_eq!(get_str(&o, "n", "x").unwrap(), "3");
        assert_eq!(get_str(&o, "b", "x").unwrap(), "false");
        assert_eq!(get_str(&o, "z", "x").unwrap(), "x");
        assert_eq!(get_str(&o, "missing", "x").unwrap(), "x");
    }

    #[test]
    fn test_get_str_rejects_containers() {
        let o = obj(r#"{"name": {"first": "a"}}"#);
        let err = get_str(&o, "name", "").unwrap_err();
        assert_eq!(err.to_string(), "field 'name': expected string, found object");
    }

    #[test]
    fn test_aliases_first_present_wins() {
        let o = obj(r#"{"dateEnd": "camel"}"#);
        assert_eq!(get_str(&o, &["date_end", "dateEnd"], "").unwrap(), "camel");
        let o = obj(r#"{"date_end": "snake", "dateEnd": "camel"}"#);
        assert_eq!(get_str(&o, &["date_end", "dateEnd"], "").unwrap(), "snake");
    }

    #[test]
    fn test_get_list_absent_is_empty() {
        let o = obj(r#"{"items": [1, 2]}"#);
        assert_eq!(get_list(&o, "items").unwrap().len(), 2);
        assert!(get_list(&o, "other").unwrap().is_empty());
    }

    #[test]
    fn test_get_list_wrong_kind() {
        let o = obj(r#"{"items": "nope"}"#);
        assert!(matches!(
            get_list(&o, "items"),
            Err(DecodeError::TypeMismatch { expected: "array", found: "string", .. })
        ));
    }

    #[test]
    fn test_get_object() {
        let o = obj(r#"{"meta": {"a": 1}, "bad": []}"#);
        assert!(get_object(&o, "meta").unwrap().is_some());
        assert!(get_object(&o, "none").unwrap().is_none());
        assert!(get_object(&o, "bad").is_err());
    }

    #[test]
    fn test_digest_map() {
        let o = obj(r#"{"name": "img", "digest": {"sha256": "abc", "sha1": "def"}}"#);
        let digests = get_digest_map(&o).unwrap();
        assert_eq!(
            digests.into_iter().collect::<Vec<_>>(),
            vec![
                ("sha1".to_string(), "def".to_string()),
                ("sha256".to_string(), "abc".to_string())
            ]
        );
        assert!(get_digest_map(&obj("{}")).unwrap().is_empty());
    }

    #[test]
    fn test_string_list() {
        let o = obj(r#"{"tags": ["a", 1]}"#);
        assert_eq!(get_string_list(&o, "tags").unwrap(), vec!["a", "1"]);
    }
}
