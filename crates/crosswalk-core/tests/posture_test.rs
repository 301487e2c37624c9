use crosswalk_core::io::read_document;
use crosswalk_core::posture::{PostureMapper, CATALOG_TITLE_PLACEHOLDER};
use crosswalk_core::{RenderConfig, Renderer, TemplateSource};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn mapper(with_component_definition: bool, with_catalog: bool) -> PostureMapper {
    let ar = read_document(&fixture("assessment-results.json")).unwrap();
    let cd = with_component_definition
        .then(|| read_document(&fixture("component-definition.json")).unwrap());
    let catalog = with_catalog.then(|| read_document(&fixture("catalog.json")).unwrap());
    PostureMapper::new(&ar, cd.as_ref(), catalog.as_ref()).unwrap()
}

#[test]
fn rule_id_matching_is_exact() {
    let mapper = mapper(false, false);
    let subjects = mapper.find_subjects("sshd_disable_root_login");
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0].uuid, "subj-1");
    assert_eq!(subjects[1].result, "fail");

    let upper = mapper.find_subjects("SSHD_DISABLE_ROOT_LOGIN");
    assert_eq!(upper.len(), 1);
    assert_eq!(upper[0].title, "case-mismatch");

    assert!(mapper.find_subjects("sshd").is_empty());
}

#[test]
fn subject_without_result_reports_error_and_no_reason() {
    let subjects = mapper(false, false).find_subjects("audit_rules_login_events");
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].result, "Error");
    assert_eq!(subjects[0].reason, "");
}

#[test]
fn component_definition_drives_inventory() {
    let value = mapper(true, true).to_template_value();
    assert_eq!(value.catalog_title, "NIST SP 800-53 Rev 5");
    // The validation component is excluded.
    assert_eq!(value.components.len(), 1);

    let component = &value.components[0];
    assert_eq!(component.component_title, "Fedora Linux");
    let controls: Vec<_> = component
        .control_results
        .iter()
        .map(|c| c.control_id.as_str())
        .collect();
    assert_eq!(controls, vec!["ac-17", "au-2", "cm-6"]);
    assert_eq!(component.control_results[0].rule_results[0].subjects.len(), 2);
    assert!(component.control_results[2].rule_results[0].subjects.is_empty());
}

#[test]
fn findings_drive_inventory_without_component_definition() {
    let value = mapper(false, false).to_template_value();
    assert_eq!(value.catalog_title, CATALOG_TITLE_PLACEHOLDER);
    assert_eq!(value.components.len(), 1);
    assert_eq!(value.components[0].component_title, "Fedora CIS Scan");
    let rules: Vec<_> = value.components[0]
        .control_results
        .iter()
        .flat_map(|c| c.rule_results.iter().map(|r| r.rule_id.as_str()))
        .collect();
    assert_eq!(rules, vec!["sshd_disable_root_login", "audit_rules_login_events"]);
}

#[test]
fn default_template_renders_report() {
    let value = mapper(true, true).to_template_value();
    let renderer = Renderer::new(&RenderConfig::default()).unwrap();
    let report = String::from_utf8(renderer.render(&value).unwrap()).unwrap();

    assert!(report.starts_with("## Catalog\nNIST SP 800-53 Rev 5\n"));
    assert!(report.contains("## Component: Fedora Linux"));
    assert!(report.contains("#### Result of control: ac-17"));
    assert!(report.contains("Rule ID: sshd_disable_root_login"));
    assert!(report.contains("  - Subject UUID: subj-2"));
    // Multi-line reasons stay inside the indented code block.
    assert!(report.contains("    PermitRootLogin yes\n    found in /etc/ssh/sshd_config"));
    assert!(report.contains("  - No subjects found."));
    assert!(!report.contains("OpenSCAP"));
}

#[test]
fn template_override_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.md");
    std::fs::write(
        &path,
        "# {{ .catalog_title }}\n{{ range .components }}* {{ .component_title }}\n{{ end }}",
    )
    .unwrap();
    let config = RenderConfig {
        template: TemplateSource::Path(path),
    };
    let value = mapper(true, false).to_template_value();
    let report = Renderer::new(&config).unwrap().render(&value).unwrap();
    assert_eq!(
        String::from_utf8(report).unwrap(),
        "# REPLACE ME\n* Fedora Linux\n"
    );
}
