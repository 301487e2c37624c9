use chrono::{TimeZone, Utc};
use crosswalk_core::io::read_document;
use crosswalk_core::policyset::{self, PolicySetOptions};
use crosswalk_core::render::to_json_pretty;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn converted() -> serde_json::Value {
    let doc = read_document(&fixture("gemara-policy.yaml")).unwrap();
    let options = PolicySetOptions {
        converted_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
    };
    let set = policyset::convert(&doc, &options).unwrap();
    serde_json::from_slice(&to_json_pretty(&set).unwrap()).unwrap()
}

#[test]
fn policyset_metadata() {
    let set = converted();
    assert_eq!(set["id"], "acme-osps");
    assert_eq!(set["version"], "1.2.0");
    assert_eq!(set["meta"]["organization-id"], "acme");
    assert_eq!(set["meta"]["converted-at"], "2025-03-01T08:00:00Z");
    assert_eq!(set["meta"]["source"], "Converted from Gemara Layer 3 Policy");
    assert_eq!(
        set["meta"]["implementation-plan"],
        serde_json::json!({
            "enforcement-methods": ["branch-protection"],
            "evaluation-points": ["pull-request", "release"]
        })
    );
    assert_eq!(set["common"]["context"]["boundaries"]["type"], "list");
    assert_eq!(set["common"]["context"]["boundaries"]["required"], false);
}

#[test]
fn one_policy_per_modification() {
    let set = converted();
    let ids: Vec<_> = set["policies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["OSPS-B-OSPS-AC-01", "OSPS-B-OSPS-AC-01-01", "SSDF-PO-3-2"]);

    let control = &set["policies"][0];
    assert_eq!(control["meta"]["mapping-type"], "guidance");
    assert_eq!(control["meta"]["category"], "control");
    assert_eq!(control["meta"]["modification-type"], "increase-strictness");
    assert_eq!(
        control["tenets"][0]["assessment"]["message"],
        "Require hardware MFA: Only phishing-resistant factors"
    );
    assert_eq!(control["tenets"][0]["runtime"], "cel@v14.0");
    assert!(control["context"]["technologies"].is_object());

    let guideline = &set["policies"][2];
    assert_eq!(guideline["meta"]["mapping-type"], "control");
    assert_eq!(guideline["tenets"][0]["error"]["guidance"], "Pin actions by SHA");
    assert!(guideline.get("context").is_none());
}
