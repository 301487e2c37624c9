use super::inventory::Inventory;
use super::{
    catalog_title, find_prop, props_of, Component, ControlResult, RuleResult, Subject,
    TemplateValue, ASSESSMENT_RULE_ID_PROP, MISSING_RESULT,
};
use crate::document::{unwrap_root, Value};
use crate::errors::DecodeError;
use crate::extract::{expect_object, get_list, get_str};

/// Observations of every result, keyed by the rule that produced them,
/// in document order.
#[derive(Debug, Clone, Default)]
pub struct AssessmentIndex {
    observations: Vec<(String, Vec<Subject>)>,
}

impl AssessmentIndex {
    pub fn build(assessment_results: &Value) -> Result<Self, DecodeError> {
        let root = expect_object(
            unwrap_root(assessment_results, "assessment-results"),
            "assessment-results",
        )?;
        let mut observations = Vec::new();

        for result in get_list(root, "results")? {
            let result = expect_object(result, "results[]")?;
            for observation in get_list(result, "observations")? {
                let observation = expect_object(observation, "observations[]")?;
                let Some(rule_id) = find_prop(props_of(observation)?, ASSESSMENT_RULE_ID_PROP)?
                else {
                    continue;
                };
                let subjects = get_list(observation, "subjects")?
                    .iter()
                    .map(map_subject)
                    .collect::<Result<Vec<_>, _>>()?;
                observations.push((rule_id, subjects));
            }
        }

        Ok(Self { observations })
    }

    /// Subjects of every observation whose `assessment-rule-id` equals `rule_id`
    /// exactly.
    pub fn find_subjects(&self, rule_id: &str) -> Vec<Subject> {
        self.observations
            .iter()
            .filter(|(id, _)| id == rule_id)
            .flat_map(|(_, subjects)| subjects.iter().cloned())
            .collect()
    }
}

/// `reason` is only surfaced alongside a `result`.
fn map_subject(raw: &Value) -> Result<Subject, DecodeError> {
    let raw = expect_object(raw, "subjects[]")?;
    let props = props_of(raw)?;
    let (result, reason) = match find_prop(props, "result")? {
        Some(result) => (result, find_prop(props, "reason")?.unwrap_or_default()),
        None => (MISSING_RESULT.to_string(), String::new()),
    };
    Ok(Subject {
        title: get_str(raw, "title", "")?,
        uuid: get_str(raw, "subject-uuid", "")?,
        result,
        reason,
    })
}

/// Builds the posture template value from assessment results.
#[derive(Debug, Clone)]
pub struct PostureMapper {
    catalog_title: String,
    inventory: Inventory,
    index: AssessmentIndex,
}

impl PostureMapper {
    /// `component_definition` supplies the component → control → rule layout;
    /// without one it is derived from the assessment results' findings.
    pub fn new(
        assessment_results: &Value,
        component_definition: Option<&Value>,
        catalog: Option<&Value>,
    ) -> Result<Self, DecodeError> {
        let inventory = match component_definition {
            Some(doc) => Inventory::from_component_definition(doc)?,
            None => Inventory::from_findings(assessment_results)?,
        };
        Ok(Self {
            catalog_title: catalog_title(catalog)?,
            inventory,
            index: AssessmentIndex::build(assessment_results)?,
        })
    }

    pub fn find_subjects(&self, rule_id: &str) -> Vec<Subject> {
        self.index.find_subjects(rule_id)
    }

    pub fn to_template_value(&self) -> TemplateValue {
        let components: Vec<Component> = self
            .inventory
            .components
            .iter()
            .filter(|component| {
                if component.is_validation() {
                    tracing::debug!(component = %component.title, "skipping validation component");
                    return false;
                }
                true
            })
            .map(|component| Component {
                component_title: component.title.clone(),
                control_results: component
                    .controls
                    .iter()
                    .map(|control| ControlResult {
                        control_id: control.control_id.clone(),
                        rule_results: control
                            .rule_ids
                            .iter()
                            .map(|rule_id| RuleResult {
                                rule_id: rule_id.clone(),
                                subjects: self.find_subjects(rule_id),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        tracing::info!(components = components.len(), "posture mapped");
        TemplateValue {
            catalog_title: self.catalog_title.clone(),
            components,
        }
    }
}
