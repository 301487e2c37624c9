//! Posture report: OSCAL assessment results grouped component → control →
//! rule → subject, ready for template rendering.

pub mod inventory;
pub mod mapper;

use serde::Serialize;

use crate::document::{Map, Value};
use crate::errors::DecodeError;
use crate::extract::{expect_object, get_str};

pub use inventory::{ComponentEntry, ControlEntry, Inventory};
pub use mapper::{AssessmentIndex, PostureMapper};

/// Catalog title used when no catalog document provides one.
pub const CATALOG_TITLE_PLACEHOLDER: &str = "REPLACE ME";

/// Result reported for a subject that carries no `result` prop.
pub const MISSING_RESULT: &str = "Error";

/// OSCAL prop naming the rule an observation was produced by.
pub const ASSESSMENT_RULE_ID_PROP: &str = "assessment-rule-id";

/// Component-definition prop linking an implemented requirement to a rule.
pub const RULE_ID_PROP: &str = "Rule_Id";

/// Component type for tooling components, excluded from reports.
pub const VALIDATION_COMPONENT_TYPE: &str = "validation";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TemplateValue {
    pub catalog_title: String,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Component {
    pub component_title: String,
    pub control_results: Vec<ControlResult>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ControlResult {
    pub control_id: String,
    pub rule_results: Vec<RuleResult>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuleResult {
    pub rule_id: String,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Subject {
    pub title: String,
    pub uuid: String,
    pub result: String,
    pub reason: String,
}

/// Find the value of the first prop named `name` in an OSCAL `props` list.
pub fn find_prop(props: &[Value], name: &str) -> Result<Option<String>, DecodeError> {
    for prop in props {
        let prop = expect_object(prop, "props[]")?;
        if get_str(prop, "name", "")? == name {
            return Ok(Some(get_str(prop, "value", "")?));
        }
    }
    Ok(None)
}

/// Catalog title from an optional catalog document (`catalog.metadata.title`).
pub fn catalog_title(catalog: Option<&Value>) -> Result<String, DecodeError> {
    let title = match catalog {
        Some(doc) => {
            let root = expect_object(crate::document::unwrap_root(doc, "catalog"), "catalog")?;
            match crate::extract::get_object(root, "metadata")? {
                Some(metadata) => get_str(metadata, "title", "")?,
                None => String::new(),
            }
        }
        None => String::new(),
    };
    if title.trim().is_empty() {
        Ok(CATALOG_TITLE_PLACEHOLDER.to_string())
    } else {
        Ok(title)
    }
}

fn props_of(obj: &Map) -> Result<&[Value], DecodeError> {
    crate::extract::get_list(obj, "props")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_json;

    #[test]
    fn test_find_prop() {
        let v = parse_json(br#"[{"name": "a", "value": "1"}, {"name": "b", "value": "2"}, {"name": "b", "value": "3"}]"#).unwrap();
        let props = v.as_array().unwrap();
        assert_eq!(find_prop(props, "b").unwrap().as_deref(), Some("2"));
        assert_eq!(find_prop(props, "c").unwrap(), None);
    }

    #[test]
    fn test_catalog_title_fallback() {
        assert_eq!(catalog_title(None).unwrap(), CATALOG_TITLE_PLACEHOLDER);
        let doc = parse_json(br#"{"catalog": {"metadata": {"title": "NIST 800-53"}}}"#).unwrap();
        assert_eq!(catalog_title(Some(&doc)).unwrap(), "NIST 800-53");
        let doc = parse_json(br#"{"metadata": {}}"#).unwrap();
        assert_eq!(catalog_title(Some(&doc)).unwrap(), CATALOG_TITLE_PLACEHOLDER);
    }
}
