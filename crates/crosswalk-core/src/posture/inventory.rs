//! Which components implement which controls, and which rules check each
//! control. Walked from an OSCAL component definition or, when none is
//! supplied, from the assessment results' own findings.

use std::collections::BTreeMap;

use super::{find_prop, props_of, ASSESSMENT_RULE_ID_PROP, RULE_ID_PROP};
use crate::document::{unwrap_root, Map, Value};
use crate::errors::DecodeError;
use crate::extract::{expect_object, get_list, get_object, get_str};

/// Title of the single component synthesized from findings when the
/// assessment results carry no metadata title.
const FINDINGS_COMPONENT_TITLE: &str = "Assessment Results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEntry {
    pub control_id: String,
    pub rule_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEntry {
    pub title: String,
    pub component_type: String,
    pub controls: Vec<ControlEntry>,
}

impl ComponentEntry {
    pub fn is_validation(&self) -> bool {
        self.component_type
            .eq_ignore_ascii_case(super::VALIDATION_COMPONENT_TYPE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub components: Vec<ComponentEntry>,
}

impl Inventory {
    /// Walk `components[].control-implementations[].implemented-requirements[]`.
    /// Rule ids come from `Rule_Id` props on the requirement and its statements.
    pub fn from_component_definition(doc: &Value) -> Result<Self, DecodeError> {
        let root = expect_object(unwrap_root(doc, "component-definition"), "component-definition")?;
        let mut components = Vec::new();

        for component in get_list(root, "components")? {
            let component = expect_object(component, "components[]")?;
            let mut controls = Vec::new();

            for implementation in get_list(component, "control-implementations")? {
                let implementation = expect_object(implementation, "control-implementations[]")?;
                for requirement in get_list(implementation, "implemented-requirements")? {
                    let requirement = expect_object(requirement, "implemented-requirements[]")?;
                    controls.push(ControlEntry {
                        control_id: get_str(requirement, "control-id", "")?,
                        rule_ids: requirement_rule_ids(requirement)?,
                    });
                }
            }

            components.push(ComponentEntry {
                title: get_str(component, "title", "")?,
                component_type: get_str(component, "type", "")?,
                controls,
            });
        }

        tracing::debug!(components = components.len(), "inventory from component definition");
        Ok(Self { components })
    }

    /// One component per assessment-results document; one control per distinct
    /// `finding.target.target-id`, checked by the rules of its related observations.
    pub fn from_findings(assessment_results: &Value) -> Result<Self, DecodeError> {
        let root = expect_object(
            unwrap_root(assessment_results, "assessment-results"),
            "assessment-results",
        )?;
        let title = match get_object(root, "metadata")? {
            Some(metadata) => get_str(metadata, "title", FINDINGS_COMPONENT_TITLE)?,
            None => FINDINGS_COMPONENT_TITLE.to_string(),
        };

        let results = get_list(root, "results")?;
        let mut rule_by_observation: BTreeMap<String, String> = BTreeMap::new();
        for result in results {
            let result = expect_object(result, "results[]")?;
            for observation in get_list(result, "observations")? {
                let observation = expect_object(observation, "observations[]")?;
                if let Some(rule_id) = find_prop(props_of(observation)?, ASSESSMENT_RULE_ID_PROP)? {
                    rule_by_observation.insert(get_str(observation, "uuid", "")?, rule_id);
                }
            }
        }

        let mut controls: Vec<ControlEntry> = Vec::new();
        for result in results {
            let result = expect_object(result, "results[]")?;
            for finding in get_list(result, "findings")? {
                let finding = expect_object(finding, "findings[]")?;
                let Some(target) = get_object(finding, "target")? else {
                    continue;
                };
                let control_id = get_str(target, "target-id", "")?;
                if control_id.is_empty() {
                    continue;
                }

                let index = match controls.iter().position(|c| c.control_id == control_id) {
                    Some(i) => i,
                    None => {
                        controls.push(ControlEntry {
                            control_id,
                            rule_ids: Vec::new(),
                        });
                        controls.len() - 1
                    }
                };

                for related in get_list(finding, "related-observations")? {
                    let related = expect_object(related, "related-observations[]")?;
                    let uuid = get_str(related, "observation-uuid", "")?;
                    if let Some(rule_id) = rule_by_observation.get(&uuid) {
                        push_unique(&mut controls[index].rule_ids, rule_id.clone());
                    }
                }
            }
        }

        tracing::debug!(controls = controls.len(), "inventory from findings");
        Ok(Self {
            components: vec![ComponentEntry {
                title,
                component_type: String::new(),
                controls,
            }],
        })
    }
}

fn requirement_rule_ids(requirement: &Map) -> Result<Vec<String>, DecodeError> {
    let mut rule_ids = Vec::new();
    collect_rule_ids(props_of(requirement)?, &mut rule_ids)?;
    for statement in get_list(requirement, "statements")? {
        let statement = expect_object(statement, "statements[]")?;
        collect_rule_ids(props_of(statement)?, &mut rule_ids)?;
    }
    Ok(rule_ids)
}

fn collect_rule_ids(props: &[Value], out: &mut Vec<String>) -> Result<(), DecodeError> {
    for prop in props {
        let prop = expect_object(prop, "props[]")?;
        if get_str(prop, "name", "")? == RULE_ID_PROP {
            let value = get_str(prop, "value", "")?;
            if !value.is_empty() {
                push_unique(out, value);
            }
        }
    }
    Ok(())
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
