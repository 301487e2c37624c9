use super::{AmpelPolicy, Framework, FrameworkMapping, Logic, Tenet, CATALOG_SCHEME};
use crate::document::{unwrap_root, Map, Value};
use crate::errors::{ConvertResult, DecodeError};
use crate::extract::{expect_object, get, get_list, get_object, get_str, get_string_list};
use crate::normalize::{clean_text, sanitize_filename, sanitize_policy_id};
use crate::render::to_json_pretty;

/// A rendered policy stub and the file name it should be written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// Render one policy file per control of every control family, in catalog order.
pub fn catalog_to_policy_files(doc: &Value) -> ConvertResult<Vec<PolicyFile>> {
    let catalog = expect_object(unwrap_root(doc, "catalog"), "catalog")?;
    let catalog_id = match get_object(catalog, "metadata")? {
        Some(metadata) => get_str(metadata, "id", "")?,
        None => String::new(),
    };

    let mut files = Vec::new();
    for family in get_list(catalog, "control-families")? {
        let family = expect_object(family, "control-families[]")?;
        for control in get_list(family, "controls")? {
            let control = expect_object(control, "controls[]")?;
            let policy = convert_control(control, &catalog_id)?;
            let control_id = get_str(control, "id", "")?;
            tracing::debug!(control = %control_id, tenets = policy.tenets.len(), "converted control");
            files.push(PolicyFile {
                file_name: format!("{}.json", sanitize_filename(&control_id)),
                contents: to_json_pretty(&policy)?,
            });
        }
    }

    tracing::info!(policies = files.len(), "converted controls to policy stubs");
    Ok(files)
}

pub fn convert_control(control: &Map, catalog_id: &str) -> Result<AmpelPolicy, DecodeError> {
    let control_id = get_str(control, "id", "")?;

    let tenets = get_list(control, "assessment-requirements")?
        .iter()
        .map(|raw| {
            let requirement = expect_object(raw, "assessment-requirements[]")?;
            let id = get_str(requirement, "id", "")?;
            let text = get_str(requirement, "text", "")?;
            Ok(Tenet {
                evaluation: evaluation_template(&id, &text),
                description: clean_text(&text),
                applicability: get_string_list(requirement, "applicability")?,
                name: id,
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    let guideline_mappings = get_list(control, "guideline-mappings")?;
    let framework = if guideline_mappings.is_empty() {
        None
    } else {
        let mut mappings = Vec::new();
        for raw in guideline_mappings {
            let mapping = expect_object(raw, "guideline-mappings[]")?;
            let framework = get_str(mapping, "reference-id", "")?;
            for entry in get_list(mapping, "entries")? {
                let entry = expect_object(entry, "entries[]")?;
                mappings.push(FrameworkMapping {
                    framework: framework.clone(),
                    control_id: get_str(entry, "reference-id", "")?,
                    strength: strength(entry)?,
                });
            }
        }
        Some(Framework {
            catalog: format!("{CATALOG_SCHEME}{}", sanitize_filename(catalog_id)),
            control: control_id.clone(),
            requirement: String::new(),
            mappings,
        })
    };

    Ok(AmpelPolicy {
        id: sanitize_policy_id(&control_id),
        name: clean_text(&get_str(control, "title", "")?),
        description: clean_text(&get_str(control, "objective", "")?),
        logic: Logic::And,
        tenets,
        framework,
    })
}

/// Numeric mapping strength; anything else counts as unset.
fn strength(entry: &Map) -> Result<i64, DecodeError> {
    Ok(match get(entry, "strength") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        Some(other) => return Err(DecodeError::mismatch("strength", "number", other.kind())),
        None => 0,
    })
}

/// Commented scaffold for a tenet's evaluation expression.
pub fn evaluation_template(requirement_id: &str, text: &str) -> String {
    format!(
        "// TODO: Implement evaluation logic for: {requirement_id}\n\
         // Requirement: {}\n\
         //\n\
         // This evaluation should return true if the requirement is met.\n\
         // You can access evidence data through the 'evidence' object.\n\
         // Example: evidence.repository.mfa_enabled === true\n\
         //\n\
         // Placeholder evaluation (replace with actual logic):\n\
         evidence.{} !== undefined",
        text.replace('\n', "\n// "),
        sanitize_policy_id(requirement_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_yaml;

    const CATALOG: &str = r#"
metadata:
  id: OSPS B
  title: Open Source Project Security Baseline
control-families:
  - title: Access Control
    controls:
      - id: OSPS-AC.01
        title: "  Require   MFA  "
        objective: |
          Reduce the risk of
          account takeover.
        assessment-requirements:
          - id: OSPS-AC-01.01
            text: "MFA is enabled\nfor all maintainers"
            applicability: [Maturity Level 1]
        guideline-mappings:
          - reference-id: NIST-800-53
            entries:
              - reference-id: IA-2
                strength: 8
              - reference-id: IA-5
      - id: OSPS-AC.02
        title: Least privilege
"#;

    fn control(index: usize) -> Map {
        let doc = parse_yaml(CATALOG.as_bytes()).unwrap();
        let family = doc.as_object().unwrap()["control-families"].as_array().unwrap()[0].clone();
        family.as_object().unwrap()["controls"].as_array().unwrap()[index]
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_control_to_policy() {
        let policy = convert_control(&control(0), "OSPS B").unwrap();
        assert_eq!(policy.id, "osps-ac-01");
        assert_eq!(policy.name, "Require MFA");
        assert_eq!(policy.description, "Reduce the risk of account takeover.");
        assert_eq!(policy.logic, Logic::And);
        assert_eq!(policy.tenets.len(), 1);
        assert_eq!(policy.tenets[0].name, "OSPS-AC-01.01");
        assert_eq!(policy.tenets[0].applicability, vec!["Maturity Level 1"]);
    }

    #[test]
    fn test_flattened_mappings() {
        let framework = convert_control(&control(0), "OSPS B").unwrap().framework.unwrap();
        assert_eq!(framework.catalog, "oscal://osps-b");
        assert_eq!(framework.control, "OSPS-AC.01");
        assert_eq!(framework.mappings.len(), 2);
        assert_eq!(framework.mappings[0].strength, 8);
        assert_eq!(framework.mappings[1].strength, 0);
    }

    #[test]
    fn test_no_mappings_no_framework() {
        let policy = convert_control(&control(1), "OSPS B").unwrap();
        assert!(policy.framework.is_none());
        assert!(policy.tenets.is_empty());
        let json = String::from_utf8(to_json_pretty(&policy).unwrap()).unwrap();
        assert!(!json.contains("framework"));
        assert!(json.contains("\"tenets\": []"));
    }

    #[test]
    fn test_evaluation_template() {
        let text = evaluation_template("OSPS-AC-01.01", "line one\nline two");
        assert!(text.starts_with("// TODO: Implement evaluation logic for: OSPS-AC-01.01\n"));
        assert!(text.contains("// Requirement: line one\n// line two\n"));
        assert!(text.ends_with("\nevidence.osps-ac-01-01 !== undefined"));
    }

    #[test]
    fn test_policy_files() {
        let doc = parse_yaml(CATALOG.as_bytes()).unwrap();
        let files = catalog_to_policy_files(&doc).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["osps-ac.01.json", "osps-ac.02.json"]);
    }
}
