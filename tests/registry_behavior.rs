//! End-to-end registry scenarios over the in-memory and redb backends.

use formfit::{
    BackendConfig, FieldType, FormRegistry, FormfitConfig, IndexKey, MatchResult, TemplateRequest,
};
use serde_json::{json, Value};

fn seed(registry: &FormRegistry) {
    let templates = [
        (
            "User Registration",
            json!([
                {"name": "email", "type": "email"},
                {"name": "phone", "type": "phone"},
                {"name": "dob", "type": "date"},
            ]),
        ),
        (
            "Contact Form",
            json!([
                {"name": "name", "type": "text"},
                {"name": "email", "type": "email"},
                {"name": "message", "type": "text"},
            ]),
        ),
        (
            "Event Creation",
            json!([
                {"name": "title", "type": "text"},
                {"name": "description", "type": "text"},
                {"name": "date", "type": "date"},
            ]),
        ),
        ("Simple Form", json!([{"name": "info", "type": "text"}])),
    ];
    for (name, fields) in templates {
        let receipt = registry
            .create_template(&TemplateRequest::new(name, fields))
            .unwrap();
        assert!(receipt.warnings.is_empty(), "{name}: {:?}", receipt.warnings);
    }
}

fn matched_name(registry: &FormRegistry, body: Value) -> Option<String> {
    registry
        .match_json(&body)
        .unwrap()
        .template_name()
        .map(str::to_string)
}

#[test]
fn registration_form_matches() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    assert_eq!(
        matched_name(
            &registry,
            json!({"email": "test@example.com", "phone": "+7 123 456 78 90", "dob": "01.01.1990"})
        )
        .as_deref(),
        Some("User Registration")
    );
}

#[test]
fn contact_form_beats_simple_form() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    assert_eq!(
        matched_name(
            &registry,
            json!({"name": "John Doe", "email": "john@example.com", "message": "Hello!", "info": "Some info"})
        )
        .as_deref(),
        Some("Contact Form")
    );
}

#[test]
fn event_creation_accepts_iso_dates() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    assert_eq!(
        matched_name(
            &registry,
            json!({"title": "Launch", "description": "Release party", "date": "2024-05-17"})
        )
        .as_deref(),
        Some("Event Creation")
    );
}

#[test]
fn unknown_field_returns_inferred_text() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    let result = registry
        .match_json(&json!({"unknown_field": "some value"}))
        .unwrap();
    match result {
        MatchResult::Unmatched { inferred_form } => {
            assert_eq!(inferred_form.len(), 1);
            assert_eq!(inferred_form["unknown_field"], FieldType::Text);
        }
        other => panic!("expected no match, got {other:?}"),
    }
}

#[test]
fn invalid_phone_format_falls_back_to_text() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    let result = registry
        .match_json(&json!({"email": "test@example.com", "phone": "81234567890", "dob": "01.01.1990"}))
        .unwrap();
    match result {
        MatchResult::Unmatched { inferred_form } => {
            assert_eq!(inferred_form["phone"], FieldType::Text);
            assert_eq!(inferred_form["email"], FieldType::Email);
            assert_eq!(inferred_form["dob"], FieldType::Date);
        }
        other => panic!("expected no match, got {other:?}"),
    }
}

#[test]
fn clear_all_forgets_everything() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    registry.clear_all().unwrap();

    assert!(registry.list_templates().unwrap().is_empty());
    assert!(registry.list_index_entries().unwrap().is_empty());
    assert_eq!(matched_name(&registry, json!({"info": "anything"})), None);
}

#[test]
fn field_missing_type_is_skipped_with_warning() {
    let registry = FormRegistry::in_memory();
    let receipt = registry
        .create_template(&TemplateRequest::new(
            "Partial",
            json!([{"name": "email", "type": "email"}, {"name": "nickname"}]),
        ))
        .unwrap();
    assert_eq!(receipt.fields.len(), 1);
    assert_eq!(receipt.warnings.len(), 1);
    assert!(receipt.warnings[0].contains("nickname"));

    // The skipped field is not indexed.
    let entries = registry.list_index_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, IndexKey::new("email", FieldType::Email));
}

#[test]
fn index_lists_every_template_under_shared_key() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    let email = registry
        .list_index_entries()
        .unwrap()
        .into_iter()
        .find(|e| e.key == IndexKey::new("email", FieldType::Email))
        .expect("email entry");
    let mut names: Vec<_> = email.templates.iter().map(|t| t.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Contact Form", "User Registration"]);
}

#[test]
fn templates_are_listed_by_name() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    let names: Vec<_> = registry
        .list_templates()
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(
        names,
        vec!["Contact Form", "Event Creation", "Simple Form", "User Registration"]
    );
}

#[test]
fn explain_reports_ranked_candidates() {
    let registry = FormRegistry::in_memory();
    seed(&registry);
    let report = registry
        .explain_json(&json!({"email": "a@b.co", "info": "x"}))
        .unwrap();
    assert_eq!(report.candidates.len(), 3);
    assert_eq!(
        report.selected.map(|s| s.template_name).as_deref(),
        Some("Simple Form")
    );
}

#[test]
fn redb_registry_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("formfit.redb");
    let mut config = FormfitConfig::in_memory();
    config.storage.backend = "redb".into();
    config.storage.path = Some(path.to_string_lossy().into_owned());
    assert_eq!(
        config.store_config().backend,
        BackendConfig::redb(path.to_string_lossy())
    );

    {
        let registry = FormRegistry::open(&config).unwrap();
        seed(&registry);
    }

    let registry = FormRegistry::open(&config).unwrap();
    assert_eq!(registry.list_templates().unwrap().len(), 4);
    assert_eq!(
        matched_name(&registry, json!({"info": "after restart"})).as_deref(),
        Some("Simple Form")
    );
}
