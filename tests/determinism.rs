use formfit::{FormRegistry, MatchResult, TemplateRequest};
use serde_json::json;

fn registry_with(names: &[&str]) -> FormRegistry {
    let registry = FormRegistry::in_memory();
    for name in names {
        registry
            .create_template(&TemplateRequest::new(
                *name,
                json!([{"name": "info", "type": "text"}]),
            ))
            .unwrap();
    }
    registry
}

#[test]
fn tied_templates_resolve_by_name_regardless_of_insert_order() {
    let forward = registry_with(&["Alpha", "Beta", "Gamma"]);
    let backward = registry_with(&["Gamma", "Beta", "Alpha"]);
    let body = json!({"info": "x"});

    for registry in [&forward, &backward] {
        for _ in 0..10 {
            let result = registry.match_json(&body).unwrap();
            assert_eq!(result.template_name(), Some("Alpha"));
        }
    }
}

#[test]
fn same_name_ties_resolve_by_id() {
    let registry = registry_with(&["Twin", "Twin"]);
    let mut ids: Vec<_> = registry
        .list_templates()
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    ids.sort();

    let result = registry.match_json(&json!({"info": "x"})).unwrap();
    match result {
        MatchResult::Matched { template_id, .. } => assert_eq!(template_id, ids[0]),
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn more_specific_template_wins_over_subset() {
    let registry = FormRegistry::in_memory();
    registry
        .create_template(&TemplateRequest::new(
            "A Small",
            json!([{"name": "email", "type": "email"}]),
        ))
        .unwrap();
    registry
        .create_template(&TemplateRequest::new(
            "Z Large",
            json!([{"name": "email", "type": "email"}, {"name": "note", "type": "text"}]),
        ))
        .unwrap();

    let result = registry
        .match_json(&json!({"email": "a@b.co", "note": "hi"}))
        .unwrap();
    assert_eq!(result.template_name(), Some("Z Large"));
}

#[test]
fn explain_is_stable_across_calls() {
    let registry = registry_with(&["One", "Two"]);
    let body = json!({"info": "x", "extra": "y"});
    let first = registry.explain_json(&body).unwrap();
    for _ in 0..5 {
        assert_eq!(registry.explain_json(&body).unwrap(), first);
    }
}
