use atelier_types::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn sample_doc() -> ProjectDocument {
    DefaultProjectConfig::default().build("alice", 1_000)
}

// ── Wire format ──────────────────────────────────────────────────

#[test]
fn document_uses_camel_case_metadata() {
    let value = serde_json::to_value(sample_doc()).unwrap();
    assert_eq!(value["project"]["createdAt"], json!(1_000));
    assert_eq!(value["project"]["lastEdited"], json!(1_000));
    assert_eq!(value["project"]["shared"], json!({ "uid": "", "token": "" }));
    assert_eq!(value["device"], json!({ "target": "esp32" }));
}

#[test]
fn parses_document_written_by_other_clients() {
    let text = r#"{
        "device": {"target": "esp8266"},
        "blocks": {"xml": "<xml></xml>"},
        "files": {"tree": {"name": "", "files": []}},
        "project": {
            "name": "Blink",
            "author": "bob",
            "shared": {"uid": "s-1", "token": "t-1"},
            "createdAt": 10,
            "lastEdited": 20
        }
    }"#;
    let doc = ProjectDocument::from_json(text).unwrap();
    assert_eq!(doc.project.name, "Blink");
    assert!(doc.project.shared.is_shared());
    assert_eq!(doc.project.last_edited, 20);
}

#[test]
fn missing_shared_defaults_to_private() {
    let text = r#"{
        "device": {}, "blocks": {}, "files": {},
        "project": {"name": "n", "createdAt": 1, "lastEdited": 1}
    }"#;
    let doc = ProjectDocument::from_json(text).unwrap();
    assert_eq!(doc.project.shared, SharedRef::default());
    assert!(!doc.project.shared.is_shared());
}

#[test]
fn malformed_document_fails_to_parse() {
    assert!(ProjectDocument::from_json("{not json").is_err());
    assert!(ProjectDocument::from_json(r#"{"device": {}}"#).is_err());
}

// ── Sections and patches ─────────────────────────────────────────

#[test]
fn merge_replaces_sections_wholesale() {
    let mut doc = sample_doc();
    let patch = ProjectPatch::new().with(Section::Files(json!({ "tree": { "name": "new" } })));
    doc.merge(&patch);
    assert_eq!(doc.files, json!({ "tree": { "name": "new" } }));
    assert_eq!(doc.device, json!({ "target": "esp32" }));
}

#[test]
fn patch_keeps_one_section_per_tag() {
    let patch = ProjectPatch::new()
        .with(Section::Device(json!({ "target": "a" })))
        .with(Section::Device(json!({ "target": "b" })));
    assert_eq!(patch.sections().len(), 1);
    assert_eq!(patch.sections()[0], Section::Device(json!({ "target": "b" })));
}

#[test]
fn silent_patch_disables_notify() {
    let patch = ProjectPatch::new().with(Section::Blocks(json!({}))).silent();
    assert!(!patch.notify());
    assert!(ProjectPatch::new().notify());
}

#[test]
fn project_mut_finds_metadata_section() {
    let doc = sample_doc();
    let mut patch = ProjectPatch::new().with(Section::Project(doc.project.clone()));
    patch.project_mut().unwrap().name = "Renamed".into();
    assert!(patch.has(SectionTag::Project));
    match &patch.sections()[0] {
        Section::Project(meta) => assert_eq!(meta.name, "Renamed"),
        other => panic!("unexpected section {other:?}"),
    }
}

#[test]
fn section_accessor_matches_tag() {
    let doc = sample_doc();
    for tag in [SectionTag::Device, SectionTag::Blocks, SectionTag::Files, SectionTag::Project] {
        assert_eq!(doc.section(tag).tag(), tag);
    }
}

// ── Export ───────────────────────────────────────────────────────

#[test]
fn export_strips_sharing_credentials() {
    let mut doc = sample_doc();
    doc.project.shared = SharedRef::new("s-9", "secret");
    let exported = doc.stripped_for_export();
    assert_eq!(exported.project.shared, SharedRef::default());
    assert_eq!(exported.project.name, doc.project.name);
    assert!(!exported.to_json().unwrap().contains("secret"));
}

// ── Template ─────────────────────────────────────────────────────

#[test]
fn default_template_has_placeholder_script() {
    let doc = sample_doc();
    assert_eq!(doc.files["tree"]["files"][0]["name"], json!("script.py"));
    assert_eq!(doc.project.name, "Empty project");
    assert_eq!(doc.project.author, "alice");
    assert_eq!(doc.project.created_at, doc.project.last_edited);
}

#[test]
fn summary_from_meta_copies_display_fields() {
    let doc = sample_doc();
    let summary = SharedProjectSummary::from_meta("s-1", &doc.project);
    assert_eq!(summary.uid, "s-1");
    assert_eq!(summary.name, "Empty project");
    assert_eq!(summary.last_edited, 1_000);
}

mod proptests {
    use atelier_types::push_unique;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn push_unique_never_duplicates(
            first in proptest::collection::vec(0u8..20, 0..30),
            second in proptest::collection::vec(0u8..20, 0..30),
        ) {
            let mut target = Vec::new();
            push_unique(&mut target, first.clone(), |v| *v);
            push_unique(&mut target, second.clone(), |v| *v);

            let unique: HashSet<u8> = target.iter().copied().collect();
            prop_assert_eq!(unique.len(), target.len());
            let expected: HashSet<u8> = first.iter().chain(second.iter()).copied().collect();
            prop_assert_eq!(unique, expected);
        }
    }
}
