use std::collections::BTreeMap;

use chrono::SecondsFormat;

use super::{
    Category, Common, ContextValue, MappingType, ModificationMeta, OutputCode, Policy, PolicyMeta,
    PolicySet, PolicySetMeta, PolicySetOptions, PolicyTenet, Predicates, TenetError, TenetMessage,
    CEL_RUNTIME, DEFAULT_POLICYSET_ID, DEFAULT_POLICYSET_VERSION, IN_TOTO_STATEMENT_V1,
    POLICY_VERSION, SLSA_PROVENANCE_V1, SOURCE_NOTE,
};
use crate::document::{Map, Value};
use crate::errors::DecodeError;
use crate::extract::{expect_object, get, get_list, get_object, get_str, get_string_list};

const SCOPE_DIMENSIONS: [&str; 3] = ["boundaries", "technologies", "providers"];

const IMPLEMENTATION_PLAN_KEYS: [&str; 7] = [
    "notification-process",
    "notified-parties",
    "evaluation",
    "evaluation-points",
    "enforcement",
    "enforcement-methods",
    "noncompliance-plan",
];

const PENDING: &str = "\"PENDING_IMPLEMENTATION\"";

/// Convert a Layer 3 policy document into a PolicySet.
pub fn convert(doc: &Value, options: &PolicySetOptions) -> Result<PolicySet, DecodeError> {
    let root = expect_object(doc, "policy")?;
    let empty = Map::new();
    let metadata = get_object(root, "metadata")?.unwrap_or(&empty);
    let scope = get_object(root, "scope")?.filter(|s| !s.is_empty());

    let title = get_str(root, "title", "")?;
    let purpose = get_str(root, "purpose", "")?;

    let mut policies = Vec::new();
    for (key, mapping_type) in [
        ("guidance-references", MappingType::Guidance),
        ("control-references", MappingType::Control),
    ] {
        for reference in get_list(root, key)? {
            let reference = expect_object(reference, "references[]")?;
            policies.extend(policies_for_reference(reference, mapping_type)?);
        }
    }

    if policies.is_empty() {
        tracing::info!("no modifications found; emitting a template policy");
        policies.push(basic_policy(metadata, &title, &purpose, scope)?);
    }

    let implementation_plan = match get_object(root, "implementation-plan")? {
        Some(plan) if !plan.is_empty() => Some(
            IMPLEMENTATION_PLAN_KEYS
                .iter()
                .filter_map(|key| plan.get(*key).map(|v| (key.to_string(), v.clone())))
                .collect(),
        ),
        _ => None,
    };

    tracing::info!(policies = policies.len(), "converted layer 3 policy");

    Ok(PolicySet {
        id: get_str(metadata, "id", DEFAULT_POLICYSET_ID)?,
        version: get_str(metadata, "version", DEFAULT_POLICYSET_VERSION)?,
        meta: PolicySetMeta {
            description: first_non_empty([purpose, title]),
            source: SOURCE_NOTE.to_string(),
            organization_id: get_str(root, "organization-id", "")?,
            converted_at: options
                .converted_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            implementation_plan,
            contacts: get(root, "contacts").filter(|c| !c.is_empty()).cloned(),
        },
        common: scope.map(|scope| Common {
            context: context_from_scope(scope),
        }),
        policies,
    })
}

/// Declares each non-empty scope dimension as an optional list parameter.
pub fn context_from_scope(scope: &Map) -> BTreeMap<String, ContextValue> {
    SCOPE_DIMENSIONS
        .iter()
        .filter_map(|dimension| {
            let value = get(scope, *dimension).filter(|v| !v.is_empty())?;
            Some((
                dimension.to_string(),
                ContextValue {
                    kind: "list".to_string(),
                    default: value.clone(),
                    required: false,
                },
            ))
        })
        .collect()
}

fn policies_for_reference(reference: &Map, mapping_type: MappingType) -> Result<Vec<Policy>, DecodeError> {
    let reference_id = get_str(reference, "reference-id", "unknown")?;
    let context = match get_object(reference, "in-scope")? {
        Some(in_scope) => Some(context_from_scope(in_scope)).filter(|c| !c.is_empty()),
        None => None,
    };

    let mut policies = Vec::new();
    for (category, key) in Category::ALL {
        for modification in get_list(reference, key)? {
            let modification = expect_object(modification, key)?;
            let policy = policy_from_modification(
                modification,
                &reference_id,
                mapping_type,
                category,
                context.clone(),
            )?;
            tracing::debug!(policy = %policy.id, "converted modification");
            policies.push(policy);
        }
    }
    Ok(policies)
}

fn policy_from_modification(
    modification: &Map,
    reference_id: &str,
    mapping_type: MappingType,
    category: Category,
    context: Option<BTreeMap<String, ContextValue>>,
) -> Result<Policy, DecodeError> {
    let target_id = get_str(modification, "target-id", "unknown")?;
    let modification_type = get_str(modification, "modification-type", "clarify")?;
    let rationale = get_str(modification, "modification-rationale", "")?;

    let tenet = match category {
        Category::Control => control_tenet(modification, &modification_type)?,
        Category::Assessment => assessment_tenet(modification)?,
        Category::Guideline => guideline_tenet(modification)?,
    };

    Ok(Policy {
        id: format!("{reference_id}-{target_id}").replace('.', "-"),
        version: POLICY_VERSION.to_string(),
        meta: PolicyMeta::Modification(ModificationMeta {
            description: first_non_empty([
                get_str(modification, "title", "")?,
                get_str(modification, "objective", "")?,
                rationale.clone(),
            ]),
            reference_id: reference_id.to_string(),
            target_id,
            modification_type,
            modification_rationale: rationale,
            mapping_type,
            category,
        }),
        context,
        tenets: vec![tenet],
        predicates: Predicates {
            types: vec![
                IN_TOTO_STATEMENT_V1.to_string(),
                SLSA_PROVENANCE_V1.to_string(),
            ],
        },
    })
}

fn control_tenet(modification: &Map, modification_type: &str) -> Result<PolicyTenet, DecodeError> {
    let title = get_str(modification, "title", "Control Check")?;
    let objective = get_str(modification, "objective", "")?;
    let code = match modification_type {
        "increase-strictness" => "true  // TODO: Implement stricter validation logic",
        "reduce-strictness" => "true  // TODO: Implement relaxed validation logic",
        "exclude" => "true  // TODO: Implement exclusion logic",
        _ => "true  // TODO: Implement clarified validation logic",
    };
    let message = format!("{title}: {objective}");
    Ok(tenet(
        code,
        [(
            "control_status",
            format!("{PENDING}  // TODO: Extract actual control status"),
        )],
        message.trim_matches(|c: char| c == ':' || c == ' ').to_string(),
        format!("Control validation failed: {title}"),
        format!(
            "Review the control requirements and ensure compliance. Modification type: {modification_type}"
        ),
    ))
}

fn assessment_tenet(modification: &Map) -> Result<PolicyTenet, DecodeError> {
    let applicability = get_string_list(modification, "applicability")?
        .into_iter()
        .map(|item| serde_json::Value::String(item).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Ok(tenet(
        "true  // TODO: Implement assessment validation logic",
        [
            (
                "assessment_result",
                format!("{PENDING}  // TODO: Extract assessment result"),
            ),
            ("applicability", format!("[{applicability}]")),
        ],
        first_non_empty([
            get_str(modification, "text", "")?,
            "Assessment requirement validated".to_string(),
        ]),
        "Assessment validation failed".to_string(),
        first_non_empty([
            get_str(modification, "recommendation", "")?,
            "Review the assessment requirements".to_string(),
        ]),
    ))
}

fn guideline_tenet(modification: &Map) -> Result<PolicyTenet, DecodeError> {
    let title = get_str(modification, "title", "Guideline Check")?;
    let recommendations = get_string_list(modification, "recommendations")?;
    let guidance = if recommendations.is_empty() {
        "Review guideline requirements".to_string()
    } else {
        recommendations.join(" | ")
    };
    Ok(tenet(
        "true  // TODO: Implement guideline validation logic",
        [(
            "guideline_compliance",
            format!("{PENDING}  // TODO: Extract compliance status"),
        )],
        format!("Guideline validated: {title}"),
        format!("Guideline validation failed: {title}"),
        guidance,
    ))
}

/// Placeholder policy for a document that carries no modifications.
fn basic_policy(
    metadata: &Map,
    title: &str,
    purpose: &str,
    scope: Option<&Map>,
) -> Result<Policy, DecodeError> {
    Ok(Policy {
        id: get_str(metadata, "id", "basic-policy")?,
        version: get_str(metadata, "version", POLICY_VERSION)?,
        meta: PolicyMeta::Template {
            description: first_non_empty([
                purpose.to_string(),
                title.to_string(),
                "Basic policy template".to_string(),
            ]),
            note: "This is a template policy. Please customize with specific tenets.".to_string(),
        },
        context: scope.map(context_from_scope),
        tenets: vec![tenet(
            "true  // TODO: Implement policy validation logic",
            [("policy_status", PENDING.to_string())],
            "Policy validated successfully".to_string(),
            "Policy validation failed".to_string(),
            "Implement specific validation logic for this policy".to_string(),
        )],
        predicates: Predicates {
            types: vec![IN_TOTO_STATEMENT_V1.to_string()],
        },
    })
}

fn tenet<const N: usize>(
    code: &str,
    outputs: [(&str, String); N],
    message: String,
    error: String,
    guidance: String,
) -> PolicyTenet {
    PolicyTenet {
        runtime: CEL_RUNTIME.to_string(),
        code: code.to_string(),
        outputs: outputs
            .into_iter()
            .map(|(name, code)| (name.to_string(), OutputCode { code }))
            .collect(),
        assessment: TenetMessage { message },
        error: TenetError {
            message: error,
            guidance,
        },
    }
}

fn first_non_empty<const N: usize>(candidates: [String; N]) -> String {
    candidates
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}
